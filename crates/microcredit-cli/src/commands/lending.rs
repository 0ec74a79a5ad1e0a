use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use microcredit_core::lending::{
    calculate_loan, calculate_with_product, review_loan_terms, LoanTerms,
};
use microcredit_core::PolicyConfig;

use crate::input;

/// Arguments for a loan amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Interest rate per period as a decimal (0.02 = 2% per month)
    #[arg(long, alias = "rate")]
    pub periodic_rate: Option<Decimal>,

    /// Number of payment periods
    #[arg(long, alias = "term")]
    pub periods: Option<u32>,

    /// Due date of the first instalment (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,
}

/// Arguments for a product-bound quote
#[derive(Args)]
pub struct ProductQuoteArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Product id (starter, growth, expansion, enterprise, or one from --policy)
    #[arg(long)]
    pub product: Option<String>,

    /// Amount borrowed
    #[arg(long, alias = "amount")]
    pub principal: Option<Decimal>,

    /// Number of payment periods
    #[arg(long, alias = "term")]
    pub periods: Option<u32>,

    /// Due date of the first instalment (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment_date: Option<NaiveDate>,
}

/// Arguments for loan term validation
#[derive(Args)]
pub struct ValidateLoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long, alias = "amount", allow_hyphen_values = true)]
    pub principal: Option<Decimal>,

    /// Interest rate per period as a decimal
    #[arg(long, alias = "rate", allow_hyphen_values = true)]
    pub periodic_rate: Option<Decimal>,

    /// Number of payment periods
    #[arg(long, alias = "term")]
    pub periods: Option<u32>,
}

#[derive(Deserialize)]
struct ProductQuoteInput {
    product_id: String,
    principal: Decimal,
    periods: u32,
    #[serde(default)]
    first_payment_date: Option<NaiveDate>,
}

pub fn run_amortize(
    args: AmortizeArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match input::read_command_input(args.input.as_deref())? {
        Some(terms) => terms,
        None => LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            periodic_rate: args
                .periodic_rate
                .ok_or("--periodic-rate is required (or provide --input)")?,
            periods: args
                .periods
                .ok_or("--periods is required (or provide --input)")?,
            first_payment_date: args.first_payment_date,
        },
    };

    let result = calculate_loan(&terms, &policy.limits)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_product_quote(
    args: ProductQuoteArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let quote: ProductQuoteInput = match input::read_command_input(args.input.as_deref())? {
        Some(quote) => quote,
        None => ProductQuoteInput {
            product_id: args
                .product
                .ok_or("--product is required (or provide --input)")?,
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            periods: args
                .periods
                .ok_or("--periods is required (or provide --input)")?,
            first_payment_date: args.first_payment_date,
        },
    };

    let result = calculate_with_product(
        &policy.products,
        &quote.product_id,
        quote.principal,
        quote.periods,
        quote.first_payment_date,
        &policy.limits,
    )?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_products(policy: &PolicyConfig) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(policy.products.products())?)
}

pub fn run_validate_loan(
    args: ValidateLoanArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = match input::read_command_input(args.input.as_deref())? {
        Some(terms) => terms,
        None => LoanTerms::new(
            args.principal
                .ok_or("--principal is required (or provide --input)")?,
            args.periodic_rate.unwrap_or(Decimal::ZERO),
            args.periods
                .ok_or("--periods is required (or provide --input)")?,
        ),
    };

    let issues = review_loan_terms(&terms, &policy.limits);
    let errors: Vec<Value> = issues
        .iter()
        .map(|e| {
            serde_json::json!({
                "field": e.field(),
                "message": e.to_string(),
            })
        })
        .collect();

    Ok(serde_json::json!({
        "result": {
            "valid": errors.is_empty(),
            "error_count": errors.len(),
        },
        "errors": errors,
    }))
}
