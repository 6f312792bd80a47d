use serde_json::Value;

use crate::error::{ProtocolError, Result};

pub const SUBJECT_SEPARATOR: &str = "::";

/// Mail subject line `protocol::role::email::transaction_id::message_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSubject {
    pub protocol: String,
    pub role: String,
    pub email: String,
    pub transaction_id: String,
    pub message_type: String,
}

impl EmailSubject {
    pub fn new(
        protocol: impl Into<String>,
        role: impl Into<String>,
        email: impl Into<String>,
        transaction_id: impl Into<String>,
        message_type: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            role: role.into(),
            email: email.into(),
            transaction_id: transaction_id.into(),
            message_type: message_type.into(),
        }
    }

    pub fn parse(subject: &str) -> Result<Self> {
        let parts: Vec<&str> = subject.trim().split(SUBJECT_SEPARATOR).collect();
        match parts.as_slice() {
            [protocol, role, email, tx, message_type] => {
                Ok(Self::new(*protocol, *role, *email, *tx, *message_type))
            }
            _ => Err(ProtocolError::InvalidSubject(format!(
                "expected 5 '::'-separated parts, got {}",
                parts.len()
            ))),
        }
    }

    /// Builds the subject for a raw message, substituting defaults for
    /// anything the message does not carry.
    pub fn from_message(message: &Value) -> Self {
        let text = |v: Option<&Value>, default: &str| {
            v.and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        let sender = message.get("sender");
        Self {
            protocol: text(message.get("protocol"), "league.v2"),
            role: text(sender.and_then(|s| s.get("role")), "UNKNOWN"),
            email: text(sender.and_then(|s| s.get("email")), "unknown@example.com"),
            transaction_id: text(message.get("message_id"), "unknown"),
            message_type: text(message.get("message_type"), "UNKNOWN"),
        }
    }
}

impl std::fmt::Display for EmailSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}::{}::{}::{}::{}",
            self.protocol, self.role, self.email, self.transaction_id, self.message_type
        )
    }
}

impl std::str::FromStr for EmailSubject {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
