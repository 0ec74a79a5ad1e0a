use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::factors::{BandTier, Factor, FactorCategory, FactorLists, Sentiment};
use super::policy::{BusinessType, DecisionThresholds, Grade, UnderwritingPolicy};
use crate::lending::{LendingLimits, ProductCatalog};
use crate::{types::*, MicroCreditError, MicroCreditResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<u64>,
    pub business_type: BusinessType,
    pub loan_amount: Money,
    pub business_age_years: Decimal,
    pub annual_revenue: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u32>,
    #[serde(default)]
    pub previous_loans: u32,
    #[serde(default)]
    pub default_history: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Approve,
    Review,
    Reject,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Review => write!(f, "review"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// The six sub-scores behind a total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub business_type: Points,
    pub loan_amount: Points,
    pub business_age: Points,
    pub revenue: Points,
    pub credit_score: Points,
    pub loan_history: Points,
}

impl ScoreBreakdown {
    pub fn total(&self) -> Points {
        [
            self.business_type,
            self.loan_amount,
            self.business_age,
            self.revenue,
            self.credit_score,
            self.loan_history,
        ]
        .into_iter()
        .fold(0, Points::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<u64>,
    pub total_score: Points,
    pub max_score: Points,
    pub risk_tier: RiskTier,
    pub recommendation: Recommendation,
    pub breakdown: ScoreBreakdown,
    pub factors: FactorLists,
    /// Display heuristic in whole percent, not a probability.
    pub confidence_pct: Decimal,
}

/// Published lending criteria derived from a policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingGuidelines {
    pub minimum_loan_amount: Money,
    pub maximum_loan_amount: Money,
    pub minimum_business_age_years: Decimal,
    pub minimum_annual_revenue: Money,
    pub maximum_loan_to_revenue: Decimal,
    pub approval_threshold: Points,
    pub review_threshold: Points,
    pub rejection_threshold: Points,
    /// Share of the best achievable total each sub-score can contribute.
    pub weights: FactorWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub business_type: Decimal,
    pub loan_amount: Decimal,
    pub business_age: Decimal,
    pub revenue: Decimal,
    pub credit_score: Decimal,
    pub loan_history: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Map a total onto a risk tier and recommendation.
pub fn classify(total: Points, thresholds: &DecisionThresholds) -> (RiskTier, Recommendation) {
    if total >= thresholds.approve {
        (RiskTier::Low, Recommendation::Approve)
    } else if total >= thresholds.review {
        (RiskTier::Medium, Recommendation::Review)
    } else {
        (RiskTier::High, Recommendation::Reject)
    }
}

/// Score an application against a policy.
///
/// Pure and deterministic: the total is the sum of six independent
/// sub-scores, each read from a policy table.
pub fn score(
    input: &UnderwritingInput,
    policy: &UnderwritingPolicy,
) -> MicroCreditResult<UnderwritingResult> {
    validate_input(input)?;

    let mut factors = FactorLists::default();

    let business_type = policy.business_type.points(&input.business_type);

    let ratio = loan_to_revenue(input);
    let loan_amount = apply(
        &mut factors,
        FactorCategory::LoanAmount,
        policy.loan_to_revenue.grade(ratio),
        ratio,
    );

    let age = Some(input.business_age_years);
    let business_age = apply(
        &mut factors,
        FactorCategory::BusinessAge,
        policy.business_age.grade(age),
        age,
    );

    let revenue_value = Some(input.annual_revenue);
    let revenue = apply(
        &mut factors,
        FactorCategory::Revenue,
        policy.revenue.grade(revenue_value),
        revenue_value,
    );

    // A zero score is a placeholder for "no bureau record", not a real score
    let credit_value = input
        .credit_score
        .filter(|&s| s > 0)
        .map(Decimal::from);
    let credit_grade = match credit_value {
        Some(_) => policy.credit_score.table.grade(credit_value),
        None => policy.credit_score.unrated,
    };
    let credit_score = apply(
        &mut factors,
        FactorCategory::CreditScore,
        credit_grade,
        credit_value,
    );

    let loans = Some(Decimal::from(input.previous_loans));
    let history_grade = if input.default_history {
        policy.loan_history.defaulted
    } else {
        policy.loan_history.table.grade(loans)
    };
    let loan_history = apply(&mut factors, FactorCategory::LoanHistory, history_grade, loans);

    if input.default_history {
        factors.negative.push(Factor::new(
            FactorCategory::PriorDefault,
            BandTier::Defaulted,
            None,
        ));
    }

    let breakdown = ScoreBreakdown {
        business_type,
        loan_amount,
        business_age,
        revenue,
        credit_score,
        loan_history,
    };
    let total_score = breakdown.total();
    let (risk_tier, recommendation) = classify(total_score, &policy.thresholds);

    debug!(
        application_id = ?input.application_id,
        total_score,
        %risk_tier,
        %recommendation,
        "application scored"
    );

    Ok(UnderwritingResult {
        application_id: input.application_id,
        total_score,
        max_score: policy.max_score(),
        risk_tier,
        recommendation,
        breakdown,
        factors,
        confidence_pct: policy.confidence.confidence(total_score),
    })
}

/// Score an application and wrap the result in the standard output envelope.
///
/// Screening-rule breaches are reported as warnings; they never change the
/// score or the recommendation.
pub fn underwrite(
    input: &UnderwritingInput,
    policy: &UnderwritingPolicy,
) -> MicroCreditResult<ComputationOutput<UnderwritingResult>> {
    let start = Instant::now();

    policy.validate()?;
    let result = score(input, policy).inspect_err(|e| {
        warn!(application_id = ?input.application_id, error = %e, "underwriting rejected input");
    })?;

    let warnings = screening_warnings(input, policy);

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "scoring": "sum of six banded sub-scores",
        "approve_at": policy.thresholds.approve,
        "review_at": policy.thresholds.review,
        "confidence": "min(cap, base + total/100 * span), heuristic",
    });

    Ok(with_metadata(
        "Automated small-business underwriting scorecard",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

/// Lending criteria implied by the policy, limits and product range.
pub fn guidelines(
    policy: &UnderwritingPolicy,
    limits: &LendingLimits,
    catalog: &ProductCatalog,
) -> UnderwritingGuidelines {
    let minimum_loan_amount = catalog
        .products()
        .iter()
        .map(|p| p.min_amount)
        .min()
        .unwrap_or(Decimal::ZERO);

    let max_total = Decimal::from(policy.max_score());
    let weight = |points: Points| {
        if max_total.is_zero() {
            Decimal::ZERO
        } else {
            (Decimal::from(points) / max_total).round_dp(4)
        }
    };

    UnderwritingGuidelines {
        minimum_loan_amount,
        maximum_loan_amount: limits.max_principal,
        minimum_business_age_years: policy.screening.minimum_business_age_years,
        minimum_annual_revenue: policy.screening.minimum_annual_revenue,
        maximum_loan_to_revenue: policy.screening.maximum_loan_to_revenue,
        approval_threshold: policy.thresholds.approve,
        review_threshold: policy.thresholds.review,
        rejection_threshold: policy.thresholds.review.saturating_sub(1),
        weights: FactorWeights {
            business_type: weight(policy.business_type.max_points()),
            loan_amount: weight(policy.loan_to_revenue.max_points()),
            business_age: weight(policy.business_age.max_points()),
            revenue: weight(policy.revenue.max_points()),
            credit_score: weight(
                policy
                    .credit_score
                    .table
                    .max_points()
                    .max(policy.credit_score.unrated.points),
            ),
            loan_history: weight(
                policy
                    .loan_history
                    .table
                    .max_points()
                    .max(policy.loan_history.defaulted.points),
            ),
        },
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &UnderwritingInput) -> MicroCreditResult<()> {
    let checks = [
        ("loan_amount", input.loan_amount, "Loan amount cannot be negative"),
        ("annual_revenue", input.annual_revenue, "Annual revenue cannot be negative"),
        (
            "business_age_years",
            input.business_age_years,
            "Business age cannot be negative",
        ),
    ];
    for (field, value, reason) in checks {
        if value < Decimal::ZERO {
            return Err(MicroCreditError::InvalidInput {
                field: field.into(),
                reason: reason.into(),
            });
        }
    }
    Ok(())
}

/// Loan amount over annual revenue; undefined when there is no revenue.
fn loan_to_revenue(input: &UnderwritingInput) -> Option<Decimal> {
    if input.annual_revenue.is_zero() {
        None
    } else {
        Some(input.loan_amount / input.annual_revenue)
    }
}

fn apply(
    factors: &mut FactorLists,
    category: FactorCategory,
    grade: Grade,
    observed: Option<Decimal>,
) -> Points {
    if grade.sentiment != Sentiment::Neutral {
        factors.push(grade.sentiment, Factor::new(category, grade.tier, observed));
    }
    grade.points
}

fn screening_warnings(input: &UnderwritingInput, policy: &UnderwritingPolicy) -> Vec<String> {
    let rules = &policy.screening;
    let mut warnings = Vec::new();

    if input.business_age_years < rules.minimum_business_age_years {
        warnings.push(format!(
            "Business age {} years is below the {}-year minimum",
            input.business_age_years, rules.minimum_business_age_years
        ));
    }
    if input.annual_revenue < rules.minimum_annual_revenue {
        warnings.push(format!(
            "Annual revenue {} is below the minimum of {}",
            input.annual_revenue, rules.minimum_annual_revenue
        ));
    }
    match loan_to_revenue(input) {
        Some(ratio) if ratio > rules.maximum_loan_to_revenue => warnings.push(format!(
            "Loan-to-revenue ratio {} exceeds the maximum of {}",
            ratio.round_dp(2),
            rules.maximum_loan_to_revenue
        )),
        None => warnings.push("No annual revenue reported; loan-to-revenue undefined".into()),
        _ => {}
    }
    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tech_applicant() -> UnderwritingInput {
        UnderwritingInput {
            application_id: Some(42),
            business_type: BusinessType::Technology,
            loan_amount: dec!(20_000),
            business_age_years: dec!(6),
            annual_revenue: dec!(100_000),
            credit_score: Some(700),
            previous_loans: 2,
            default_history: false,
        }
    }

    #[test]
    fn test_reference_application() {
        let result = score(&tech_applicant(), &UnderwritingPolicy::default()).unwrap();

        assert_eq!(
            result.breakdown,
            ScoreBreakdown {
                business_type: 24,
                loan_amount: 20,
                business_age: 15,
                revenue: 15,
                credit_score: 12,
                loan_history: 7,
            }
        );
        assert_eq!(result.total_score, 93);
        assert_eq!(result.risk_tier, RiskTier::Low);
        assert_eq!(result.recommendation, Recommendation::Approve);
        assert_eq!(result.confidence_pct, dec!(93));
        assert_eq!(result.application_id, Some(42));
        // Every non-sector factor lands in its top two bands
        assert_eq!(result.factors.positive.len(), 5);
        assert!(result.factors.negative.is_empty());
        assert!(result.factors.warnings.is_empty());
    }

    #[test]
    fn test_classify_boundaries() {
        let t = DecisionThresholds::default();
        assert_eq!(classify(80, &t), (RiskTier::Low, Recommendation::Approve));
        assert_eq!(classify(79, &t), (RiskTier::Medium, Recommendation::Review));
        assert_eq!(classify(60, &t), (RiskTier::Medium, Recommendation::Review));
        assert_eq!(classify(59, &t), (RiskTier::High, Recommendation::Reject));
    }

    #[test]
    fn test_missing_credit_score_is_neutral() {
        let mut input = tech_applicant();
        input.credit_score = None;
        let result = score(&input, &UnderwritingPolicy::default()).unwrap();
        assert_eq!(result.breakdown.credit_score, 10);
        assert!(!result
            .factors
            .positive
            .iter()
            .any(|f| f.category == FactorCategory::CreditScore));
    }

    #[test]
    fn test_zero_credit_score_counts_as_unrated() {
        let mut input = tech_applicant();
        input.credit_score = Some(0);
        let result = score(&input, &UnderwritingPolicy::default()).unwrap();
        assert_eq!(result.breakdown.credit_score, 10);

        input.credit_score = None;
        assert_eq!(score(&input, &UnderwritingPolicy::default()).unwrap(), result);
    }

    #[test]
    fn test_default_overrides_history() {
        let mut input = tech_applicant();
        input.previous_loans = 10;
        input.default_history = true;
        let result = score(&input, &UnderwritingPolicy::default()).unwrap();

        assert_eq!(result.breakdown.loan_history, 2);
        let negatives: Vec<_> = result.factors.negative.iter().map(|f| f.category).collect();
        assert_eq!(
            negatives,
            vec![FactorCategory::LoanHistory, FactorCategory::PriorDefault]
        );
    }

    #[test]
    fn test_zero_revenue_falls_to_bottom_band() {
        let mut input = tech_applicant();
        input.annual_revenue = Decimal::ZERO;
        let result = score(&input, &UnderwritingPolicy::default()).unwrap();
        assert_eq!(result.breakdown.loan_amount, 8);
        assert_eq!(result.breakdown.revenue, 4);
        assert_eq!(result.factors.warnings.len(), 1);
        assert_eq!(result.factors.warnings[0].observed, None);
    }

    #[test]
    fn test_negative_inputs_rejected() {
        let mut input = tech_applicant();
        input.business_age_years = dec!(-1);
        match score(&input, &UnderwritingPolicy::default()).unwrap_err() {
            MicroCreditError::InvalidInput { field, .. } => assert_eq!(field, "business_age_years"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_screening_warnings() {
        let input = UnderwritingInput {
            application_id: None,
            business_type: BusinessType::Other("Mining".into()),
            loan_amount: dec!(12_000),
            business_age_years: dec!(0.25),
            annual_revenue: dec!(8_000),
            credit_score: None,
            previous_loans: 0,
            default_history: false,
        };
        let out = underwrite(&input, &UnderwritingPolicy::default()).unwrap();
        assert_eq!(out.warnings.len(), 3);
        assert_eq!(out.result.recommendation, Recommendation::Reject);
    }

    #[test]
    fn test_guidelines_match_house_policy() {
        let g = guidelines(
            &UnderwritingPolicy::default(),
            &LendingLimits::default(),
            &ProductCatalog::default(),
        );
        assert_eq!(g.minimum_loan_amount, dec!(1_000));
        assert_eq!(g.maximum_loan_amount, dec!(1_000_000));
        assert_eq!(g.approval_threshold, 80);
        assert_eq!(g.review_threshold, 60);
        assert_eq!(g.rejection_threshold, 59);
        // 24 of 99 available points
        assert_eq!(g.weights.business_type, dec!(0.2424));
        assert_eq!(g.weights.loan_history, dec!(0.1010));
    }
}
