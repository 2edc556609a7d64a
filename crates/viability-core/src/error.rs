use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViabilityError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ViabilityError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ViabilityError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ViabilityError {
    fn from(e: serde_json::Error) -> Self {
        ViabilityError::SerializationError(e.to_string())
    }
}
