pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "valuation")]
pub mod session;

#[cfg(feature = "inputs")]
pub mod inputs;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for all dcf-core operations
pub type DcfResult<T> = Result<T, ValuationError>;
