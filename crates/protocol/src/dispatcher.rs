use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};
use crate::registry::{self, list_types};
use crate::subject::EmailSubject;
use crate::validation::ValidationResult;

/// A message in any of the accepted input forms.
#[derive(Debug, Clone)]
pub enum DispatchInput {
    Value(Value),
    Json(String),
    File(PathBuf),
}

impl DispatchInput {
    pub fn into_value(self) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Json(text) => Ok(serde_json::from_str(&text)?),
            Self::File(path) => {
                let text = std::fs::read_to_string(&path)?;
                Ok(serde_json::from_str(&text)?)
            }
        }
    }
}

impl From<Value> for DispatchInput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Strings ending in `.json` are read as file paths, anything else as
/// JSON text.
impl From<&str> for DispatchInput {
    fn from(text: &str) -> Self {
        if text.trim_end().ends_with(".json") {
            Self::File(PathBuf::from(text.trim()))
        } else {
            Self::Json(text.to_string())
        }
    }
}

impl From<&Path> for DispatchInput {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dispatched {
    pub protocol: String,
    pub message_type: String,
    pub direction: String,
    pub message_id: String,
    pub email_subject: String,
    pub processed_payload: Value,
}

/// Uniform result of dispatching one message.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Success(Dispatched),
    /// The message could not be read or its type is not registered.
    Rejected { error_code: String, message: String },
    Invalid {
        message_type: String,
        validation: ValidationResult,
    },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Success(ok) => {
                let mut value = json!({"status": "success"});
                if let (Some(map), Ok(Value::Object(fields))) =
                    (value.as_object_mut(), serde_json::to_value(ok))
                {
                    map.extend(fields);
                }
                value
            }
            Self::Rejected {
                error_code,
                message,
            } => json!({
                "status": "error",
                "error_code": error_code,
                "message": message,
                "supported_types": list_types(),
            }),
            Self::Invalid {
                message_type,
                validation,
            } => json!({
                "status": "error",
                "message_type": message_type,
                "validation": validation,
            }),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            error_code: "INVALID_MESSAGE".into(),
            message: message.into(),
        }
    }
}

/// Reads, identifies and validates one message.
pub fn dispatch(input: impl Into<DispatchInput>) -> DispatchOutcome {
    let message = match input.into().into_value() {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Could not read message");
            return DispatchOutcome::rejected(e.to_string());
        }
    };
    dispatch_value(&message)
}

pub fn dispatch_value(message: &Value) -> DispatchOutcome {
    let Some(type_name) = message.get("message_type").and_then(Value::as_str) else {
        return DispatchOutcome::rejected("message has no 'message_type'");
    };
    let Some(entry) = registry::lookup(type_name) else {
        let e = ProtocolError::UnknownMessageType(type_name.to_string());
        warn!(message_type = %type_name, "Unknown message type");
        return DispatchOutcome::rejected(e.to_string());
    };

    let validation = entry.validate(message);
    if !validation.is_valid {
        debug!(
            message_type = %entry.message_type,
            errors = validation.errors.len(),
            "Message failed validation"
        );
        return DispatchOutcome::Invalid {
            message_type: entry.message_type.as_str().to_string(),
            validation,
        };
    }

    DispatchOutcome::Success(Dispatched {
        protocol: entry.protocol().as_str().to_string(),
        message_type: entry.message_type.as_str().to_string(),
        direction: entry.direction().as_str().to_string(),
        message_id: message
            .get("message_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        email_subject: EmailSubject::from_message(message).to_string(),
        processed_payload: message.get("payload").cloned().unwrap_or(Value::Null),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn end_round() -> Value {
        json!({
            "protocol": "league.v2",
            "message_type": "BROADCAST_END_LEAGUE_ROUND",
            "message_id": "end-1",
            "timestamp": "2026-01-05T10:00:00+00:00",
            "sender": {"email": "lm@league.test", "role": "LEAGUEMANAGER"},
            "recipient_id": "ALL",
            "payload": {"round_number": 1}
        })
    }

    #[test]
    fn test_success_shape() {
        let out = dispatch(end_round()).to_json();
        assert_eq!(out["status"], "success");
        assert_eq!(out["direction"], "LM→All");
        assert_eq!(
            out["email_subject"],
            "league.v2::LEAGUEMANAGER::lm@league.test::end-1::BROADCAST_END_LEAGUE_ROUND"
        );
        assert_eq!(out["processed_payload"]["round_number"], 1);
    }

    #[test]
    fn test_unknown_type_lists_supported() {
        let out = dispatch(json!({"message_type": "NOPE"})).to_json();
        assert_eq!(out["status"], "error");
        assert_eq!(out["error_code"], "INVALID_MESSAGE");
        assert_eq!(out["supported_types"].as_array().unwrap().len(), 24);
    }

    #[test]
    fn test_validation_failure_shape() {
        let mut msg = end_round();
        msg["payload"]["round_number"] = json!(0);
        let out = dispatch(msg).to_json();
        assert_eq!(out["status"], "error");
        assert_eq!(out["validation"]["is_valid"], false);
        assert_eq!(
            out["validation"]["errors"][0]["field"],
            "payload.round_number"
        );
    }

    #[test]
    fn test_json_text_and_file_inputs() {
        let text = end_round().to_string();
        assert!(dispatch(text.as_str()).is_success());

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap().to_string();
        assert!(dispatch(path.as_str()).is_success());

        assert!(!dispatch("{not json").is_success());
    }
}
