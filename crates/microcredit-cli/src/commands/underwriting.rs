use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use microcredit_core::underwriting::{
    guidelines, underwrite, BusinessType, Factor, UnderwritingInput,
};
use microcredit_core::PolicyConfig;

use crate::input;

/// Arguments for scoring a loan application
#[derive(Args)]
pub struct UnderwriteArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Application reference echoed in the result
    #[arg(long)]
    pub application_id: Option<u64>,

    /// Business sector, e.g. "Retail & Trade" or "Technology"
    #[arg(long)]
    pub business_type: Option<String>,

    /// Requested loan amount
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Years in operation
    #[arg(long, alias = "age")]
    pub business_age_years: Option<Decimal>,

    /// Annual revenue
    #[arg(long, alias = "revenue")]
    pub annual_revenue: Option<Decimal>,

    /// Bureau credit score, if the applicant has one
    #[arg(long)]
    pub credit_score: Option<u32>,

    /// Number of loans previously repaid
    #[arg(long, default_value_t = 0)]
    pub previous_loans: u32,

    /// Applicant has defaulted on a loan before
    #[arg(long)]
    pub default_history: bool,

    /// Render factors as sentences instead of tags
    #[arg(long)]
    pub explain: bool,
}

pub fn run_underwrite(
    args: UnderwriteArgs,
    policy: &PolicyConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let application: UnderwritingInput = match input::read_command_input(args.input.as_deref())? {
        Some(application) => application,
        None => UnderwritingInput {
            application_id: args.application_id,
            business_type: BusinessType::from(
                args.business_type
                    .ok_or("--business-type is required (or provide --input)")?,
            ),
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            business_age_years: args
                .business_age_years
                .ok_or("--business-age-years is required (or provide --input)")?,
            annual_revenue: args
                .annual_revenue
                .ok_or("--annual-revenue is required (or provide --input)")?,
            credit_score: args.credit_score,
            previous_loans: args.previous_loans,
            default_history: args.default_history,
        },
    };

    let output = underwrite(&application, &policy.underwriting)?;
    let explained = args.explain.then(|| {
        let factors = &output.result.factors;
        serde_json::json!({
            "positive": render_factors(&factors.positive),
            "negative": render_factors(&factors.negative),
            "warnings": render_factors(&factors.warnings),
        })
    });

    let mut value = serde_json::to_value(&output)?;
    if let Some(explained) = explained {
        value["result"]["factors"] = explained;
    }
    Ok(value)
}

pub fn run_guidelines(policy: &PolicyConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let g = guidelines(&policy.underwriting, &policy.limits, &policy.products);
    Ok(serde_json::to_value(g)?)
}

fn render_factors(factors: &[Factor]) -> Vec<String> {
    factors.iter().map(ToString::to_string).collect()
}
