use napi::Result as NapiResult;
use napi_derive::napi;

use microcredit_core::lending::{self, LoanTerms};
use microcredit_core::underwriting::{self, UnderwritingInput};
use microcredit_core::PolicyConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse an optional policy document; `None` or an empty string means defaults.
fn policy_from(policy_json: Option<String>) -> NapiResult<PolicyConfig> {
    match policy_json.as_deref().map(str::trim) {
        None | Some("") => Ok(PolicyConfig::default()),
        Some(json) => PolicyConfig::from_json(json).map_err(to_napi_error),
    }
}

#[derive(serde::Deserialize)]
struct ProductQuoteRequest {
    product_id: String,
    principal: rust_decimal::Decimal,
    periods: u32,
    #[serde(default)]
    first_payment_date: Option<chrono::NaiveDate>,
}

// ---------------------------------------------------------------------------
// Lending
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_loan(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = policy_from(policy_json)?;
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lending::calculate_loan(&terms, &policy.limits).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_with_product(
    input_json: String,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let policy = policy_from(policy_json)?;
    let request: ProductQuoteRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lending::calculate_with_product(
        &policy.products,
        &request.product_id,
        request.principal,
        request.periods,
        request.first_payment_date,
        &policy.limits,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn loan_products(policy_json: Option<String>) -> NapiResult<String> {
    let policy = policy_from(policy_json)?;
    serde_json::to_string(policy.products.products()).map_err(to_napi_error)
}

#[napi]
pub fn validate_loan(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = policy_from(policy_json)?;
    let terms: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let errors: Vec<String> = lending::review_loan_terms(&terms, &policy.limits)
        .iter()
        .map(ToString::to_string)
        .collect();
    serde_json::to_string(&serde_json::json!({
        "valid": errors.is_empty(),
        "errors": errors,
    }))
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Underwriting
// ---------------------------------------------------------------------------

#[napi]
pub fn underwrite(input_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let policy = policy_from(policy_json)?;
    let input: UnderwritingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = underwriting::underwrite(&input, &policy.underwriting).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn underwriting_guidelines(policy_json: Option<String>) -> NapiResult<String> {
    let policy = policy_from(policy_json)?;
    let guidelines =
        underwriting::guidelines(&policy.underwriting, &policy.limits, &policy.products);
    serde_json::to_string(&guidelines).map_err(to_napi_error)
}
