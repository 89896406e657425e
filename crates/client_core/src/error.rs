use thiserror::Error;

use crate::validate::ValidationErrors;

/// Failures surfaced to the presentation layer. `Validation` is raised
/// before any request is sent; the rest classify server responses.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("record already exists: {0}")]
    Conflict(String),

    #[error("server rejected request ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// The error map when this is a pre-flight validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ClientError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict(_))
    }
}
