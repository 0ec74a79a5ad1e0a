//! Loan quoting: level-payment amortization and product-bound quotes.

pub mod amortization;
pub mod products;

pub use amortization::{
    annuity_payment, calculate_loan, compute_amortization, review_loan_terms, validate_loan_terms,
    AmortizationEntry, AmortizationOutput, LendingLimits, LoanTerms,
};
pub use products::{calculate_with_product, LoanProduct, ProductCatalog};
