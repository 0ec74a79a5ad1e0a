use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::amortization::{calculate_loan, AmortizationOutput, LendingLimits, LoanTerms};
use crate::error::ProductBound;
use crate::{types::*, MicroCreditError, MicroCreditResult};

/// A named loan product with a fixed periodic rate and amount/term bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub id: String,
    pub name: String,
    pub min_amount: Money,
    pub max_amount: Money,
    pub periodic_rate: Rate,
    pub min_term: u32,
    pub max_term: u32,
}

impl LoanProduct {
    /// Check a request against this product's bounds, amount before term.
    pub fn check(&self, principal: Money, periods: u32) -> MicroCreditResult<()> {
        let violation = |bound, value: Decimal, limit: Decimal| {
            Err(MicroCreditError::ProductConstraintViolation {
                product_id: self.id.clone(),
                bound,
                value,
                limit,
            })
        };

        if principal < self.min_amount {
            return violation(ProductBound::MinAmount, principal, self.min_amount);
        }
        if principal > self.max_amount {
            return violation(ProductBound::MaxAmount, principal, self.max_amount);
        }
        if periods < self.min_term {
            return violation(
                ProductBound::MinTerm,
                Decimal::from(periods),
                Decimal::from(self.min_term),
            );
        }
        if periods > self.max_term {
            return violation(
                ProductBound::MaxTerm,
                Decimal::from(periods),
                Decimal::from(self.max_term),
            );
        }
        Ok(())
    }
}

/// Ordered list of the products on offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCatalog {
    products: Vec<LoanProduct>,
}

impl ProductCatalog {
    pub fn new(products: Vec<LoanProduct>) -> Self {
        Self { products }
    }

    pub fn find(&self, id: &str) -> Option<&LoanProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn products(&self) -> &[LoanProduct] {
        &self.products
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Default for ProductCatalog {
    /// Starter, growth, expansion and enterprise loans, monthly rates.
    fn default() -> Self {
        let product = |id: &str, name: &str, min, max, rate, min_term, max_term| LoanProduct {
            id: id.into(),
            name: name.into(),
            min_amount: min,
            max_amount: max,
            periodic_rate: rate,
            min_term,
            max_term,
        };
        Self::new(vec![
            product("starter", "Starter Loan", dec!(1_000), dec!(10_000), dec!(0.03), 3, 12),
            product("growth", "Growth Loan", dec!(10_000), dec!(50_000), dec!(0.025), 6, 24),
            product("expansion", "Expansion Loan", dec!(50_000), dec!(200_000), dec!(0.02), 12, 36),
            product("enterprise", "Enterprise Loan", dec!(200_000), dec!(1_000_000), dec!(0.015), 24, 60),
        ])
    }
}

/// Quote a loan under a named product: bounds first, then the normal calculation
/// at the product's rate. Global limits still apply.
pub fn calculate_with_product(
    catalog: &ProductCatalog,
    product_id: &str,
    principal: Money,
    periods: u32,
    first_payment_date: Option<NaiveDate>,
    limits: &LendingLimits,
) -> MicroCreditResult<ComputationOutput<AmortizationOutput>> {
    let product = catalog
        .find(product_id)
        .ok_or_else(|| MicroCreditError::UnknownProduct(product_id.to_string()))?;

    product.check(principal, periods).inspect_err(|e| {
        warn!(product = product_id, error = %e, "product quote rejected");
    })?;

    let terms = LoanTerms {
        principal,
        periodic_rate: product.periodic_rate,
        periods,
        first_payment_date,
    };
    let mut output = calculate_loan(&terms, limits)?;
    output.methodology = format!("{} ({})", output.methodology, product.name);
    if let serde_json::Value::Object(ref mut map) = output.assumptions {
        map.insert("product".into(), serde_json::json!(product.id));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_catalog() {
        let catalog = ProductCatalog::default();
        let ids: Vec<_> = catalog.products().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["starter", "growth", "expansion", "enterprise"]);
        assert_eq!(catalog.find("growth").unwrap().periodic_rate, dec!(0.025));
        assert!(catalog.find("payday").is_none());
    }

    #[test]
    fn test_quote_uses_product_rate() {
        let catalog = ProductCatalog::default();
        let out = calculate_with_product(
            &catalog,
            "starter",
            dec!(5_000),
            12,
            None,
            &LendingLimits::default(),
        )
        .unwrap();
        assert_eq!(out.result.periodic_rate, dec!(0.03));
        assert_eq!(out.result.schedule.len(), 12);
        assert!(out.methodology.contains("Starter Loan"));
        assert_eq!(out.assumptions["product"], "starter");
    }

    #[test]
    fn test_unknown_product() {
        let err = calculate_with_product(
            &ProductCatalog::default(),
            "payday",
            dec!(5_000),
            12,
            None,
            &LendingLimits::default(),
        )
        .unwrap_err();
        assert_eq!(err, MicroCreditError::UnknownProduct("payday".into()));
    }

    #[test]
    fn test_each_bound_named() {
        let starter = ProductCatalog::default().find("starter").unwrap().clone();
        let cases = [
            (dec!(999), 6, ProductBound::MinAmount, dec!(1_000)),
            (dec!(10_001), 6, ProductBound::MaxAmount, dec!(10_000)),
            (dec!(5_000), 2, ProductBound::MinTerm, dec!(3)),
            (dec!(5_000), 13, ProductBound::MaxTerm, dec!(12)),
        ];
        for (amount, term, expected, expected_limit) in cases {
            match starter.check(amount, term).unwrap_err() {
                MicroCreditError::ProductConstraintViolation {
                    product_id,
                    bound,
                    limit,
                    ..
                } => {
                    assert_eq!(product_id, "starter");
                    assert_eq!(bound, expected);
                    assert_eq!(limit, expected_limit);
                }
                other => panic!("Expected ProductConstraintViolation, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bounds_inclusive() {
        let starter = ProductCatalog::default().find("starter").unwrap().clone();
        assert!(starter.check(dec!(1_000), 3).is_ok());
        assert!(starter.check(dec!(10_000), 12).is_ok());
    }

    #[test]
    fn test_global_limit_still_applies() {
        let catalog = ProductCatalog::new(vec![LoanProduct {
            id: "jumbo".into(),
            name: "Jumbo".into(),
            min_amount: dec!(1),
            max_amount: dec!(5_000_000),
            periodic_rate: dec!(0.01),
            min_term: 1,
            max_term: 240,
        }]);
        let err = calculate_with_product(
            &catalog,
            "jumbo",
            dec!(2_000_000),
            12,
            None,
            &LendingLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MicroCreditError::LimitExceeded { .. }));
    }
}
