use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid game id '{value}': {reason}")]
    InvalidGameId { value: String, reason: String },

    #[error("Invalid season transition from {from} on {event}")]
    InvalidSeasonTransition { from: String, event: String },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn invalid_game_id(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGameId {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::invalid_game_id("12", "expected 7 digits");
        assert!(error.to_string().contains("'12'"));
        assert!(error.to_string().contains("expected 7 digits"));
    }
}
