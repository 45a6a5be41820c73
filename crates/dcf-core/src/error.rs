use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Invalid argument: {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Invalid capital structure: {0}")]
    InvalidCapitalStructure(String),

    #[error("Degenerate discount rate {rate}: rate must be greater than -100%")]
    DegenerateDiscountRate { rate: Decimal },

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ValuationError {
    fn from(e: serde_json::Error) -> Self {
        ValuationError::SerializationError(e.to_string())
    }
}

/// Lift a checked Decimal operation into `Overflow` when it yields `None`.
pub(crate) fn checked(value: Option<Decimal>, context: &str) -> Result<Decimal, ValuationError> {
    value.ok_or_else(|| ValuationError::Overflow {
        context: context.to_string(),
    })
}
