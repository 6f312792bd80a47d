//! Per-message-type payload validators.
//!
//! Each validator receives a [`Checker`] already scoped to `payload.` and
//! the payload object itself. Envelope-level checks shared by every type
//! live in [`validate_envelope`].

pub(crate) mod league;
pub(crate) mod q21;

use serde_json::Value;

use crate::envelope::Role;
use crate::message_type::MessageType;
use crate::validation::{Checker, ErrorKind, ValidationResult};

pub(crate) type PayloadValidator = fn(&mut Checker<'_>, &Value);

pub(crate) fn validator_for(message_type: MessageType) -> PayloadValidator {
    match message_type {
        MessageType::BroadcastStartSeason => league::start_season,
        MessageType::SeasonRegistrationRequest => league::registration_request,
        MessageType::SeasonRegistrationResponse => league::registration_response,
        MessageType::BroadcastAssignmentTable => league::assignment_table,
        MessageType::ResponseGroupAssignment => league::group_assignment_ack,
        MessageType::BroadcastNewLeagueRound => league::new_round,
        MessageType::BroadcastEndLeagueRound => league::end_round,
        MessageType::BroadcastEndSeason => league::end_season,
        MessageType::BroadcastKeepAlive => league::keep_alive,
        MessageType::ResponseKeepAlive => league::keep_alive_response,
        MessageType::BroadcastCriticalPause => league::critical_pause,
        MessageType::BroadcastCriticalContinue | MessageType::BroadcastCriticalReset => {
            league::critical_control
        }
        MessageType::BroadcastRoundResults => league::round_results,
        MessageType::MatchResultReport => league::match_result_report,
        MessageType::LeagueCompleted => league::league_completed,
        MessageType::ErrorResponse => league::error_response,
        MessageType::Q21WarmupCall => q21::warmup_call,
        MessageType::Q21WarmupResponse => q21::warmup_response,
        MessageType::Q21RoundStart => q21::round_start,
        MessageType::Q21QuestionsBatch => q21::questions_batch,
        MessageType::Q21AnswersBatch => q21::answers_batch,
        MessageType::Q21GuessSubmission => q21::guess_submission,
        MessageType::Q21ScoreFeedback => q21::score_feedback,
    }
}

/// Checks the envelope fields common to every message and then the
/// type-specific payload. All errors land in one result.
pub fn validate_envelope(message_type: MessageType, message: &Value) -> ValidationResult {
    let mut result = ValidationResult::default();
    let mut c = Checker::new(&mut result);

    if !message.is_object() {
        c.error(
            "message",
            ErrorKind::InvalidType,
            Some("object".into()),
            Some(crate::validation::json_type_name(message).into()),
        );
        return result;
    }

    if let Some(protocol) = c.require_str(message, "protocol") {
        let expected = message_type.protocol().as_str();
        if protocol != expected {
            c.error(
                "protocol",
                ErrorKind::InvalidValue,
                Some(expected.to_string()),
                Some(protocol.to_string()),
            );
        }
    }
    c.require_str(message, "message_id");
    c.require_iso_datetime(message, "timestamp");
    c.required(message, "recipient_id");

    if let Some(sender) = c.required(message, "sender") {
        if c.object(sender, "sender").is_some() {
            let mut s = c.nested("sender.");
            s.require_str(sender, "email");
            s.require_one_of(sender, "role", &Role::ALL);
        }
    }

    // Present-but-empty context values are valid; only null/absent fails.
    for field in message_type.required_context() {
        c.required(message, field);
    }

    if let Some(payload) = c.required(message, "payload") {
        if c.object(payload, "payload").is_some() {
            let mut p = c.nested("payload.");
            validator_for(message_type)(&mut p, payload);
        }
    }

    result
}

/// Validates only the payload of a message type.
pub fn validate_payload(message_type: MessageType, payload: &Value) -> ValidationResult {
    let mut result = ValidationResult::default();
    {
        let mut c = Checker::with_prefix(&mut result, "payload.");
        validator_for(message_type)(&mut c, payload);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keep_alive() -> Value {
        json!({
            "protocol": "league.v2",
            "message_type": "BROADCAST_KEEP_ALIVE",
            "message_id": "ka-1",
            "timestamp": "2026-01-05T10:00:00+00:00",
            "sender": {"email": "lm@league.test", "role": "LEAGUEMANAGER"},
            "recipient_id": "ALL",
            "payload": {}
        })
    }

    #[test]
    fn test_valid_envelope() {
        let result = validate_envelope(MessageType::BroadcastKeepAlive, &keep_alive());
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_envelope_errors_accumulate() {
        let mut msg = keep_alive();
        msg["protocol"] = json!("Q21G.v1");
        msg["timestamp"] = json!("noon");
        msg["sender"]["role"] = json!("ADMIN");
        msg.as_object_mut().unwrap().remove("payload");

        let result = validate_envelope(MessageType::BroadcastKeepAlive, &msg);
        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["protocol", "timestamp", "sender.role", "payload"]);
    }

    #[test]
    fn test_empty_context_counts_as_present() {
        let msg = json!({
            "protocol": "Q21G.v1",
            "message_type": "Q21WARMUPRESPONSE",
            "message_id": "w-1",
            "timestamp": "2026-01-05T10:00:00+00:00",
            "sender": {"email": "p1@test", "role": "PLAYER"},
            "recipient_id": "ref",
            "game_id": "",
            "payload": {"match_id": "0101001", "answer": "4", "auth_token": "tok_1"}
        });
        let result = validate_envelope(MessageType::Q21WarmupResponse, &msg);
        assert!(result.is_valid, "{:?}", result.errors);

        let mut without = msg.clone();
        without.as_object_mut().unwrap().remove("game_id");
        let result = validate_envelope(MessageType::Q21WarmupResponse, &without);
        assert!(result.has_error_for("game_id"));
    }
}
