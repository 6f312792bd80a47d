use async_trait::async_trait;
use protocol::{EmailSubject, Envelope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// One inbound message as observed by a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub from: String,
    #[serde(default)]
    pub subject: String,
    pub body: Value,
}

impl RawMessage {
    pub fn new(from: impl Into<String>, subject: impl Into<String>, body: Value) -> Self {
        Self {
            from: from.into(),
            subject: subject.into(),
            body,
        }
    }

    /// Type named by the body, else by the subject line.
    pub fn message_type(&self) -> Option<String> {
        if let Some(name) = self.body.get("message_type").and_then(Value::as_str) {
            return Some(name.to_string());
        }
        EmailSubject::parse(&self.subject)
            .ok()
            .map(|subject| subject.message_type)
    }

    pub fn message_id(&self) -> Option<&str> {
        self.body.get("message_id").and_then(Value::as_str)
    }
}

/// Best-effort delivery used by the runner.
///
/// `poll` returns only messages not returned before; `send` reports
/// whether the message was handed off.
#[async_trait]
pub trait Transport: Send {
    async fn poll(&mut self) -> Result<Vec<RawMessage>>;

    async fn send(&mut self, recipient: &str, subject: &str, envelope: &Envelope) -> Result<bool>;
}
