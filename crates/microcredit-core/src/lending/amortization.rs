use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::{types::*, MicroCreditError, MicroCreditResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// A fixed-rate, fully amortizing loan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Interest applied once per payment period (0.02 = 2% per month).
    pub periodic_rate: Rate,
    pub periods: u32,
    /// Due date of the first instalment. Later instalments fall one month apart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanTerms {
    pub fn new(principal: Money, periodic_rate: Rate, periods: u32) -> Self {
        Self {
            principal,
            periodic_rate,
            periods,
            first_payment_date: None,
        }
    }

    pub fn with_first_payment_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_date = Some(date);
        self
    }
}

/// Global caps applied to every quote, whatever the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingLimits {
    pub max_principal: Money,
    pub max_periods: u32,
}

impl Default for LendingLimits {
    fn default() -> Self {
        Self {
            max_principal: dec!(1_000_000),
            max_periods: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub remaining_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub principal: Money,
    pub periodic_rate: Rate,
    pub periods: u32,
    pub periodic_payment: Money,
    pub total_interest: Money,
    pub total_payment: Money,
    pub schedule: Vec<AmortizationEntry>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Level payment that fully amortizes `principal` over `periods` at `rate`.
///
/// `P * r / (1 - (1+r)^-n)`, or `P / n` for an interest-free loan. Working
/// from the discount factor keeps every intermediate at or below `P * r`, so
/// high rates converge to `P * r` instead of overflowing. The result is
/// unrounded.
pub fn annuity_payment(principal: Money, rate: Rate, periods: u32) -> MicroCreditResult<Money> {
    if periods == 0 {
        return Err(MicroCreditError::InvalidInput {
            field: "periods".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    let n = Decimal::from(periods);
    if rate.is_zero() {
        return Ok(principal / n);
    }

    let discount = discount_factor(rate)?;
    // Underflow to zero is the limit we want: the payment tends to P * r.
    let remaining = discount
        .checked_powu(u64::from(periods))
        .unwrap_or(Decimal::ZERO);
    let denominator = Decimal::ONE - remaining;

    // A rate too small to move (1+r)^-n at 28 digits behaves as interest-free.
    if denominator.is_zero() {
        return Ok(principal / n);
    }

    principal
        .checked_mul(rate)
        .and_then(|interest| interest.checked_div(denominator))
        .ok_or_else(|| out_of_range("periodic payment"))
}

/// Reject terms that cannot be amortized, then terms over the global caps.
///
/// Stops at the first problem; see [`review_loan_terms`] for the full list.
pub fn validate_loan_terms(terms: &LoanTerms, limits: &LendingLimits) -> MicroCreditResult<()> {
    match review_loan_terms(terms, limits).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Every problem with the terms, input errors first and limit breaches after.
/// An empty list means the terms are acceptable.
pub fn review_loan_terms(terms: &LoanTerms, limits: &LendingLimits) -> Vec<MicroCreditError> {
    let mut issues = Vec::new();

    if terms.principal <= Decimal::ZERO {
        issues.push(MicroCreditError::InvalidInput {
            field: "principal".into(),
            reason: "Loan amount must be greater than 0".into(),
        });
    }
    if terms.periods == 0 {
        issues.push(MicroCreditError::InvalidInput {
            field: "periods".into(),
            reason: "Loan term must be at least 1 period".into(),
        });
    }
    if terms.periodic_rate < Decimal::ZERO {
        issues.push(MicroCreditError::InvalidInput {
            field: "periodic_rate".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }

    if terms.principal > limits.max_principal {
        issues.push(MicroCreditError::LimitExceeded {
            field: "principal".into(),
            value: terms.principal,
            limit: limits.max_principal,
        });
    }
    if terms.periods > limits.max_periods {
        issues.push(MicroCreditError::LimitExceeded {
            field: "periods".into(),
            value: Decimal::from(terms.periods),
            limit: Decimal::from(limits.max_periods),
        });
    }

    issues
}

/// Fixed payment, totals and the full schedule for a loan.
///
/// Everything is carried at full precision; rounding to cents happens only
/// on the values written to the output. Each closing balance comes from the
/// closed form `P * (1 - v^m) / (1 - v^n)` with `m` payments left, so error
/// does not compound across periods and the last balance is exactly zero.
pub fn compute_amortization(
    terms: &LoanTerms,
    limits: &LendingLimits,
) -> MicroCreditResult<AmortizationOutput> {
    validate_loan_terms(terms, limits)?;

    let rate = terms.periodic_rate;
    let payment = annuity_payment(terms.principal, rate, terms.periods)?;

    let outstanding = outstanding_fractions(rate, terms.periods)?;

    let mut schedule = Vec::with_capacity(terms.periods as usize);
    let mut opening = terms.principal;

    for period in 1..=terms.periods {
        let interest = opening
            .checked_mul(rate)
            .ok_or_else(|| out_of_range("interest"))?;
        let closing = terms
            .principal
            .checked_mul(outstanding[(terms.periods - period) as usize])
            .ok_or_else(|| out_of_range("remaining balance"))?;
        let principal_portion = opening - closing;

        schedule.push(AmortizationEntry {
            period,
            due_date: due_date(terms.first_payment_date, period)?,
            payment: round_money(payment),
            principal_portion: round_money(principal_portion),
            interest_portion: round_money(interest),
            remaining_balance: round_money(closing),
        });
        opening = closing;
    }

    let total_payment = payment
        .checked_mul(Decimal::from(terms.periods))
        .ok_or_else(|| out_of_range("total payment"))?;
    let total_interest = total_payment - terms.principal;

    debug!(
        principal = %terms.principal,
        periodic_rate = %rate,
        periods = terms.periods,
        periodic_payment = %round_money(payment),
        total_interest = %round_money(total_interest),
        "amortization computed"
    );

    Ok(AmortizationOutput {
        principal: terms.principal,
        periodic_rate: rate,
        periods: terms.periods,
        periodic_payment: round_money(payment),
        total_interest: round_money(total_interest),
        total_payment: round_money(total_payment),
        schedule,
    })
}

/// Amortize a loan and wrap the result in the standard output envelope.
pub fn calculate_loan(
    terms: &LoanTerms,
    limits: &LendingLimits,
) -> MicroCreditResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = compute_amortization(terms, limits).inspect_err(|e| {
        warn!(error = %e, "loan calculation rejected");
    })?;

    if terms.periodic_rate.is_zero() {
        warnings.push("Zero interest rate: payments repay principal only".into());
    }
    if output.total_interest > terms.principal {
        warnings.push(format!(
            "Total interest {} exceeds the amount borrowed {}",
            output.total_interest, terms.principal
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "payment_formula": "P * r * (1+r)^n / ((1+r)^n - 1); P / n when r = 0",
        "rate_basis": "periodic (per payment period), decimal fraction",
        "rounding": "2 dp half-up, applied to outputs only",
        "max_principal": limits.max_principal.to_string(),
        "max_periods": limits.max_periods,
    });

    Ok(with_metadata(
        "Level-payment annuity amortization",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn discount_factor(rate: Rate) -> MicroCreditResult<Decimal> {
    Decimal::ONE
        .checked_add(rate)
        .and_then(|growth| Decimal::ONE.checked_div(growth))
        .ok_or_else(|| out_of_range("discount factor"))
}

/// Share of the principal still owed with `m` payments left, indexed by `m`.
/// Entry 0 is zero and entry `periods` is one.
fn outstanding_fractions(rate: Rate, periods: u32) -> MicroCreditResult<Vec<Decimal>> {
    let n = Decimal::from(periods);
    let linear = || -> Vec<Decimal> { (0..=periods).map(|m| Decimal::from(m) / n).collect() };

    if rate.is_zero() {
        return Ok(linear());
    }

    let discount = discount_factor(rate)?;
    let mut powers = Vec::with_capacity(periods as usize + 1);
    let mut power = Decimal::ONE;
    for _ in 0..=periods {
        powers.push(power);
        power = power.checked_mul(discount).unwrap_or(Decimal::ZERO);
    }

    let denominator = Decimal::ONE - powers[periods as usize];
    if denominator.is_zero() {
        return Ok(linear());
    }

    powers
        .into_iter()
        .map(|p| {
            (Decimal::ONE - p)
                .checked_div(denominator)
                .ok_or_else(|| out_of_range("remaining balance"))
        })
        .collect()
}

fn out_of_range(quantity: &str) -> MicroCreditError {
    MicroCreditError::InvalidInput {
        field: "periodic_rate".into(),
        reason: format!("{quantity} exceeds decimal range at this rate"),
    }
}

fn due_date(first: Option<NaiveDate>, period: u32) -> MicroCreditResult<Option<NaiveDate>> {
    let Some(first) = first else {
        return Ok(None);
    };
    first
        .checked_add_months(Months::new(period - 1))
        .map(Some)
        .ok_or_else(|| MicroCreditError::InvalidInput {
            field: "first_payment_date".into(),
            reason: format!("due date for period {period} is out of range"),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
