pub mod calendar;
pub mod captable;
pub mod error;
pub mod expense;
pub mod model;
pub mod pricing;
pub mod store;
pub mod types;
pub mod valuation;
pub mod vesting;

pub use error::EquityError;
pub use types::*;

/// Standard result type for all equity-comp operations
pub type EquityResult<T> = Result<T, EquityError>;
