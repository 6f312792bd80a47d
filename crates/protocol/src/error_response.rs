use serde_json::{Map, Value};

use crate::envelope::{message_id, wire_timestamp, Envelope, Protocol, Role, Sender};
use crate::message_type::MessageType;

/// Standard `error_code` values carried by ERROR_RESPONSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidMessage,
    Unauthorized,
    NotRegistered,
    DeadlinePassed,
    InvalidState,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotRegistered => "NOT_REGISTERED",
            Self::DeadlinePassed => "DEADLINE_PASSED",
            Self::InvalidState => "INVALID_STATE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds ERROR_RESPONSE envelopes.
#[derive(Debug, Clone)]
pub struct ErrorResponseBuilder {
    sender: Sender,
}

impl ErrorResponseBuilder {
    pub fn new(sender_email: impl Into<String>, role: Role, logical_id: Option<String>) -> Self {
        Self {
            sender: Sender {
                email: sender_email.into(),
                role,
                logical_id,
            },
        }
    }

    pub fn build(
        &self,
        code: ErrorCode,
        error_message: impl Into<String>,
        original_message_type: &str,
        recoverable: bool,
        recipient_id: impl Into<String>,
        correlation_id: Option<String>,
    ) -> Envelope {
        let mut payload = Map::new();
        payload.insert("error_code".into(), Value::from(code.as_str()));
        payload.insert("error_message".into(), Value::from(error_message.into()));
        payload.insert(
            "original_message_type".into(),
            Value::from(original_message_type),
        );
        payload.insert("recoverable".into(), Value::from(recoverable));

        Envelope {
            protocol: Protocol::League,
            message_type: MessageType::ErrorResponse.as_str().to_string(),
            message_id: message_id("error"),
            timestamp: wire_timestamp(),
            sender: self.sender.clone(),
            recipient_id: recipient_id.into(),
            league_id: None,
            season_id: None,
            round_id: None,
            game_id: None,
            correlation_id,
            payload,
        }
    }
}
