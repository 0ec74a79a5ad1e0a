pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "lending")]
pub mod lending;

#[cfg(feature = "underwriting")]
pub mod underwriting;

pub use config::PolicyConfig;
pub use error::{MicroCreditError, ProductBound};
pub use types::*;

/// Standard result type for all micro-credit operations
pub type MicroCreditResult<T> = Result<T, MicroCreditError>;
