use thiserror::Error;

use crate::validation::FieldError;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown message type: '{0}'")]
    UnknownMessageType(String),

    #[error("[{message_type}] Validation failed with {} error(s)", errors.len())]
    Validation {
        message_type: String,
        errors: Vec<FieldError>,
    },

    #[error("Invalid subject line: {0}")]
    InvalidSubject(String),
}

impl ProtocolError {
    pub fn validation(message_type: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self::Validation {
            message_type: message_type.into(),
            errors,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
