use serde_json::Value;

use crate::envelope::Protocol;
use crate::message_type::{Direction, MessageType};
use crate::payloads::{self, PayloadValidator};
use crate::validation::{Checker, ValidationResult};

/// Static description of one message type and its validator.
#[derive(Clone, Copy)]
pub struct RegistryEntry {
    pub message_type: MessageType,
    pub description: &'static str,
    validator: PayloadValidator,
}

impl RegistryEntry {
    pub fn protocol(&self) -> Protocol {
        self.message_type.protocol()
    }

    pub fn direction(&self) -> Direction {
        self.message_type.direction()
    }

    pub fn validate_payload(&self, payload: &Value) -> ValidationResult {
        let mut result = ValidationResult::default();
        (self.validator)(&mut Checker::with_prefix(&mut result, "payload."), payload);
        result
    }

    pub fn validate(&self, message: &Value) -> ValidationResult {
        payloads::validate_envelope(self.message_type, message)
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("message_type", &self.message_type)
            .field("description", &self.description)
            .finish()
    }
}

fn describe(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::BroadcastStartSeason => "League opens a season for registration",
        MessageType::SeasonRegistrationRequest => "Participant asks to join a season",
        MessageType::SeasonRegistrationResponse => "League accepts or rejects a registration",
        MessageType::BroadcastAssignmentTable => "Game assignments for the season",
        MessageType::ResponseGroupAssignment => "Referee acknowledges its assignments",
        MessageType::BroadcastNewLeagueRound => "A round begins",
        MessageType::BroadcastEndLeagueRound => "A round ends",
        MessageType::BroadcastEndSeason => "The season ends",
        MessageType::BroadcastKeepAlive => "League liveness probe",
        MessageType::ResponseKeepAlive => "Liveness reply",
        MessageType::BroadcastCriticalPause => "Suspend all activity",
        MessageType::BroadcastCriticalContinue => "Resume after a pause",
        MessageType::BroadcastCriticalReset => "Drop all season state",
        MessageType::BroadcastRoundResults => "Published results of a round",
        MessageType::MatchResultReport => "Referee reports a game outcome",
        MessageType::LeagueCompleted => "Final standings",
        MessageType::ErrorResponse => "Protocol-level error",
        MessageType::Q21WarmupCall => "Referee sends the warmup question",
        MessageType::Q21WarmupResponse => "Player answers the warmup question",
        MessageType::Q21RoundStart => "Referee announces book, hint and association word",
        MessageType::Q21QuestionsBatch => "Player submits its questions",
        MessageType::Q21AnswersBatch => "Referee answers the questions",
        MessageType::Q21GuessSubmission => "Player submits its final guess",
        MessageType::Q21ScoreFeedback => "Referee scores the guess",
    }
}

/// Registry entry for a message type.
pub fn entry(message_type: MessageType) -> RegistryEntry {
    RegistryEntry {
        message_type,
        description: describe(message_type),
        validator: payloads::validator_for(message_type),
    }
}

/// Resolves a wire name (including underscore aliases) to its entry.
pub fn lookup(name: &str) -> Option<RegistryEntry> {
    MessageType::parse(name).map(entry)
}

pub fn is_supported(name: &str) -> bool {
    MessageType::parse(name).is_some()
}

/// Canonical wire names of every registered type, sorted.
pub fn list_types() -> Vec<&'static str> {
    let mut names: Vec<_> = MessageType::ALL.iter().map(MessageType::as_str).collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_type_has_an_entry() {
        let names = list_types();
        assert_eq!(names.len(), MessageType::ALL.len());
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        for name in names {
            let entry = lookup(name).unwrap();
            assert_eq!(entry.message_type.as_str(), name);
            assert!(!entry.description.is_empty());
        }
    }

    #[test]
    fn test_alias_lookup() {
        let entry = lookup("Q21_ANSWERS_BATCH").unwrap();
        assert_eq!(entry.message_type, MessageType::Q21AnswersBatch);
        assert_eq!(entry.protocol(), Protocol::Q21);
        assert!(!is_supported("Q21_UNKNOWN"));
    }

    #[test]
    fn test_entry_validates_payload() {
        let entry = entry(MessageType::BroadcastEndLeagueRound);
        assert!(entry.validate_payload(&json!({"round_number": 2})).is_valid);
        assert!(!entry.validate_payload(&json!({"round_number": 0})).is_valid);
    }
}
