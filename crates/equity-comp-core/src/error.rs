use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquityError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Not found: {entity}")]
    NotFound { entity: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EquityError {
    fn from(e: serde_json::Error) -> Self {
        EquityError::SerializationError(e.to_string())
    }
}
