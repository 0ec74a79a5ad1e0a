use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which bound of a loan product a request fell outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductBound {
    MinAmount,
    MaxAmount,
    MinTerm,
    MaxTerm,
}

impl std::fmt::Display for ProductBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MinAmount => write!(f, "minimum amount"),
            Self::MaxAmount => write!(f, "maximum amount"),
            Self::MinTerm => write!(f, "minimum term"),
            Self::MaxTerm => write!(f, "maximum term"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MicroCreditError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Limit exceeded: {field} is {value}, maximum is {limit}")]
    LimitExceeded {
        field: String,
        value: Decimal,
        limit: Decimal,
    },

    #[error("Product '{product_id}' constraint violated: {value} is outside the {bound} of {limit}")]
    ProductConstraintViolation {
        product_id: String,
        bound: ProductBound,
        value: Decimal,
        limit: Decimal,
    },

    #[error("Unknown loan product: {0}")]
    UnknownProduct(String),

    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MicroCreditError {
    /// Name of the input field the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidInput { field, .. } | Self::LimitExceeded { field, .. } => Some(field),
            Self::ProductConstraintViolation { bound, .. } => match bound {
                ProductBound::MinAmount | ProductBound::MaxAmount => Some("principal"),
                ProductBound::MinTerm | ProductBound::MaxTerm => Some("periods"),
            },
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MicroCreditError {
    fn from(e: serde_json::Error) -> Self {
        MicroCreditError::SerializationError(e.to_string())
    }
}
