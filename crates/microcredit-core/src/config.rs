//! Policy configuration: lending caps, the product range and underwriting
//! tables, bundled so a deployment can swap all of it from one file.

use serde::{Deserialize, Serialize};

use crate::MicroCreditResult;

#[cfg(feature = "lending")]
use crate::lending::{LendingLimits, ProductCatalog};
#[cfg(feature = "lending")]
use crate::MicroCreditError;
#[cfg(feature = "lending")]
use std::collections::HashSet;

#[cfg(feature = "underwriting")]
use crate::underwriting::UnderwritingPolicy;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    #[cfg(feature = "lending")]
    pub limits: LendingLimits,
    #[cfg(feature = "lending")]
    pub products: ProductCatalog,
    #[cfg(feature = "underwriting")]
    pub underwriting: UnderwritingPolicy,
}

impl PolicyConfig {
    /// Parse a JSON policy document, filling omitted sections with defaults.
    pub fn from_json(json: &str) -> MicroCreditResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MicroCreditResult<()> {
        #[cfg(feature = "lending")]
        self.validate_lending()?;

        #[cfg(feature = "underwriting")]
        self.underwriting.validate()?;

        Ok(())
    }

    #[cfg(feature = "lending")]
    fn validate_lending(&self) -> MicroCreditResult<()> {
        if self.limits.max_principal <= rust_decimal::Decimal::ZERO || self.limits.max_periods == 0
        {
            return Err(MicroCreditError::InvalidPolicy(
                "lending limits must be positive".into(),
            ));
        }

        let mut seen = HashSet::new();
        for product in self.products.products() {
            if !seen.insert(product.id.as_str()) {
                return Err(MicroCreditError::InvalidPolicy(format!(
                    "duplicate product id '{}'",
                    product.id
                )));
            }
            if product.min_amount > product.max_amount || product.min_term > product.max_term {
                return Err(MicroCreditError::InvalidPolicy(format!(
                    "product '{}' has inverted bounds",
                    product.id
                )));
            }
            if product.periodic_rate < rust_decimal::Decimal::ZERO {
                return Err(MicroCreditError::InvalidPolicy(format!(
                    "product '{}' has a negative rate",
                    product.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "underwriting"))]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PolicyConfig::from_json(r#"{ "limits": { "max_periods": 60 } }"#).unwrap();
        assert_eq!(config.limits.max_periods, 60);
        assert_eq!(config.limits.max_principal, dec!(1_000_000));
        assert_eq!(config.products, ProductCatalog::default());
    }

    #[test]
    fn test_duplicate_product_ids_rejected() {
        let mut products = ProductCatalog::default().products().to_vec();
        products.push(products[0].clone());
        let config = PolicyConfig {
            products: ProductCatalog::new(products),
            ..PolicyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate product id 'starter'"));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = PolicyConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, MicroCreditError::SerializationError(_)));
    }
}
