use thiserror::Error;

use crate::config::ConfigError;
use crate::executor::CallbackError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid season transition: {event} not allowed from {from}")]
    InvalidTransition { from: String, event: String },

    #[error("Season is paused; {event} rejected")]
    Paused { event: String },

    #[error("No active game")]
    NoActiveGame,

    #[error("Message for game {received} but active game is {expected}")]
    GameMismatch { expected: String, received: String },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Domain error: {0}")]
    Core(#[from] referee_core::CoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidMessage(reason.into())
    }

    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }

    pub fn game_mismatch(expected: impl Into<String>, received: impl Into<String>) -> Self {
        Self::GameMismatch {
            expected: expected.into(),
            received: received.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
