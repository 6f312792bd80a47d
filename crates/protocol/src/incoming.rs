use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};
use crate::message_type::MessageType;
use crate::validation::{Checker, ErrorKind, ValidationResult};

/// A player message that passed the structural gate in front of the
/// game engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMessage {
    pub message_type: MessageType,
    pub message_id: Option<String>,
    pub sender_email: String,
    pub game_id: String,
    pub payload: Map<String, Value>,
}

impl PlayerMessage {
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn payload_value(&self) -> Value {
        Value::Object(self.payload.clone())
    }
}

/// Checks a raw player message body and extracts what routing needs.
///
/// The game id is required here; whether it matches the active game is
/// decided by the season layer.
pub fn parse_player_message(body: &Value) -> Result<PlayerMessage> {
    let mut result = ValidationResult::default();
    let mut c = Checker::new(&mut result);

    let message_type = c.require_str(body, "message_type").and_then(|name| {
        match MessageType::parse(name).filter(MessageType::is_player_message) {
            Some(t) => Some(t),
            None => {
                c.error(
                    "message_type",
                    ErrorKind::InvalidValue,
                    Some("player message type".into()),
                    Some(name.to_string()),
                );
                None
            }
        }
    });

    let sender_email = match c.required(body, "sender") {
        Some(sender) if sender.is_object() => c.child("sender").require_str(sender, "email"),
        Some(sender) => {
            c.object(sender, "sender");
            None
        }
        None => None,
    };

    let game_id = c.required(body, "game_id").and_then(Value::as_str);

    let payload = c
        .required(body, "payload")
        .and_then(|p| c.object(p, "payload"));

    if let (Some(t), Some(map)) = (message_type, payload) {
        let mut p = c.child("payload");
        let payload_value = body.get("payload").unwrap_or(&Value::Null);
        match t {
            MessageType::Q21WarmupResponse => {
                p.required(payload_value, "answer");
            }
            MessageType::Q21QuestionsBatch => {
                p.require_list(payload_value, "questions", 0);
            }
            MessageType::Q21GuessSubmission if map.is_empty() => {
                c.error(
                    "payload",
                    ErrorKind::OutOfRange,
                    Some("at least 1 key".into()),
                    Some("0 keys".into()),
                );
            }
            _ => {}
        }
    }

    let message_id = body
        .get("message_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    match (message_type, sender_email, game_id, payload) {
        (Some(message_type), Some(email), Some(game_id), Some(payload)) if result.is_valid => {
            Ok(PlayerMessage {
                message_type,
                message_id,
                sender_email: email.to_string(),
                game_id: game_id.to_string(),
                payload: payload.clone(),
            })
        }
        _ => Err(ProtocolError::validation(
            body.get("message_type")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN"),
            result.errors,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn warmup() -> Value {
        json!({
            "message_type": "Q21_WARMUP_RESPONSE",
            "message_id": "w-1",
            "sender": {"email": "p1@test.com", "role": "PLAYER"},
            "game_id": "0101001",
            "payload": {"answer": "4"}
        })
    }

    #[test]
    fn test_accepts_alias_and_extracts_fields() {
        let msg = parse_player_message(&warmup()).unwrap();
        assert_eq!(msg.message_type, MessageType::Q21WarmupResponse);
        assert_eq!(msg.sender_email, "p1@test.com");
        assert_eq!(msg.game_id, "0101001");
        assert_eq!(msg.payload_str("answer"), Some("4"));
        assert_eq!(msg.message_id.as_deref(), Some("w-1"));
    }

    #[test]
    fn test_rejects_missing_game_id() {
        let mut body = warmup();
        body.as_object_mut().unwrap().remove("game_id");
        match parse_player_message(&body) {
            Err(ProtocolError::Validation { errors, .. }) => {
                assert_eq!(errors[0].field, "game_id");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_per_kind_payload_rules() {
        let mut body = warmup();
        body["payload"] = json!({});
        assert!(parse_player_message(&body).is_err());

        body["message_type"] = json!("Q21QUESTIONSBATCH");
        body["payload"] = json!({"questions": "none"});
        assert!(parse_player_message(&body).is_err());

        body["message_type"] = json!("Q21GUESSSUBMISSION");
        body["payload"] = json!({});
        assert!(parse_player_message(&body).is_err());
        body["payload"] = json!({"opening_sentence": "x"});
        assert!(parse_player_message(&body).is_ok());
    }

    #[test]
    fn test_rejects_non_player_types() {
        let mut body = warmup();
        body["message_type"] = json!("Q21WARMUPCALL");
        assert!(parse_player_message(&body).is_err());
    }
}
