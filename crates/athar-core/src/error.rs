use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtharError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Degenerate rate: {field} — {reason}")]
    DegenerateRate { field: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AtharError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        AtharError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(field: &str, reason: impl Into<String>) -> Self {
        AtharError::DegenerateRate {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AtharError {
    fn from(e: serde_json::Error) -> Self {
        AtharError::SerializationError(e.to_string())
    }
}
