use chrono::{Duration, SecondsFormat, Utc};
use referee_core::{
    Answer, GameResult, GameState, MatchStatus, PlayerState, ScoreBreakdown,
};
use serde_json::{json, Map, Value};

use crate::envelope::{message_id, wire_timestamp, Envelope, Protocol, Role, Sender};
use crate::message_type::MessageType;
use crate::subject::EmailSubject;

pub const WARMUP_DEADLINE_MINUTES: i64 = 2;
pub const ROUND_START_DEADLINE_MINUTES: i64 = 5;
pub const ANSWERS_DEADLINE_MINUTES: i64 = 5;
pub const QUESTIONS_REQUIRED: u32 = 20;

/// Recipient id used on envelopes addressed to the league manager.
pub const LEAGUE_MANAGER_RECIPIENT: &str = "LEAGUEMANAGER";

/// An envelope ready for the transport, with its mail recipient and subject.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub recipient: String,
    pub subject: String,
    pub envelope: Envelope,
}

impl OutgoingMessage {
    /// Wraps an envelope, deriving the subject line from its sender.
    pub fn new(recipient: impl Into<String>, envelope: Envelope) -> Self {
        let subject = EmailSubject::new(
            envelope.protocol.as_str(),
            envelope.sender.role.as_str(),
            &envelope.sender.email,
            &envelope.message_id,
            &envelope.message_type,
        );
        Self {
            recipient: recipient.into(),
            subject: subject.to_string(),
            envelope,
        }
    }

    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::parse(&self.envelope.message_type)
    }

    pub fn is_match_result(&self) -> bool {
        self.message_type() == Some(MessageType::MatchResultReport)
    }
}

/// ISO timestamp `minutes` from now, in wire format.
pub fn deadline_in(minutes: i64) -> String {
    (Utc::now() + Duration::minutes(minutes)).to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Builds every envelope the referee sends.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    pub referee_email: String,
    pub referee_id: String,
    pub league_id: String,
    pub season_id: String,
}

impl EnvelopeBuilder {
    pub fn new(
        referee_email: impl Into<String>,
        referee_id: impl Into<String>,
        league_id: impl Into<String>,
        season_id: impl Into<String>,
    ) -> Self {
        Self {
            referee_email: referee_email.into(),
            referee_id: referee_id.into(),
            league_id: league_id.into(),
            season_id: season_id.into(),
        }
    }

    fn sender(&self) -> Sender {
        Sender {
            email: self.referee_email.clone(),
            role: Role::Referee,
            logical_id: Some(self.referee_id.clone()),
        }
    }

    fn finish(&self, recipient: &str, envelope: Envelope) -> OutgoingMessage {
        OutgoingMessage::new(recipient, envelope)
    }

    fn q21_envelope(
        &self,
        message_type: MessageType,
        id: String,
        player: &PlayerState,
        game: &GameState,
        correlation_id: Option<String>,
        payload: Map<String, Value>,
    ) -> OutgoingMessage {
        let envelope = Envelope {
            protocol: Protocol::Q21,
            message_type: message_type.as_str().to_string(),
            message_id: id,
            timestamp: wire_timestamp(),
            sender: self.sender(),
            recipient_id: player.participant_id.clone(),
            league_id: None,
            season_id: None,
            round_id: None,
            game_id: Some(game.game_id.clone()),
            correlation_id,
            payload,
        };
        self.finish(&player.email, envelope)
    }

    #[allow(clippy::too_many_arguments)]
    fn league_envelope(
        &self,
        message_type: MessageType,
        id: String,
        recipient_email: &str,
        season_id: &str,
        round_id: Option<String>,
        game_id: Option<String>,
        correlation_id: Option<String>,
        payload: Map<String, Value>,
    ) -> OutgoingMessage {
        let envelope = Envelope {
            protocol: Protocol::League,
            message_type: message_type.as_str().to_string(),
            message_id: id,
            timestamp: wire_timestamp(),
            sender: self.sender(),
            recipient_id: LEAGUE_MANAGER_RECIPIENT.to_string(),
            league_id: Some(self.league_id.clone()),
            season_id: Some(season_id.to_string()),
            round_id,
            game_id,
            correlation_id,
            payload,
        };
        self.finish(recipient_email, envelope)
    }

    pub fn warmup_call(
        &self,
        game: &GameState,
        player: &PlayerState,
        warmup_question: &str,
    ) -> OutgoingMessage {
        let id = message_id(&format!(
            "warmup-{}-{}",
            game.match_id, player.participant_id
        ));
        let payload = object(json!({
            "match_id": game.match_id,
            "warmup_question": warmup_question,
            "deadline": deadline_in(WARMUP_DEADLINE_MINUTES),
            "auth_token": game.auth_token,
        }));
        self.q21_envelope(MessageType::Q21WarmupCall, id, player, game, None, payload)
    }

    pub fn round_start(&self, game: &GameState, player: &PlayerState) -> OutgoingMessage {
        let id = message_id(&format!(
            "round-start-{}-{}",
            game.match_id, player.participant_id
        ));
        let payload = object(json!({
            "match_id": game.match_id,
            "book_name": game.book_name,
            "book_hint": game.book_hint,
            "association_word": game.association_word,
            "questions_required": QUESTIONS_REQUIRED,
            "deadline": deadline_in(ROUND_START_DEADLINE_MINUTES),
            "auth_token": game.auth_token,
        }));
        self.q21_envelope(MessageType::Q21RoundStart, id, player, game, None, payload)
    }

    pub fn answers_batch(
        &self,
        game: &GameState,
        player: &PlayerState,
        answers: &[Answer],
        correlation_id: Option<String>,
    ) -> OutgoingMessage {
        let id = message_id(&format!(
            "answers-{}-{}",
            game.match_id, player.participant_id
        ));
        let payload = object(json!({
            "match_id": game.match_id,
            "answers": answers,
            "deadline": deadline_in(ANSWERS_DEADLINE_MINUTES),
            "auth_token": game.auth_token,
        }));
        self.q21_envelope(
            MessageType::Q21AnswersBatch,
            id,
            player,
            game,
            correlation_id,
            payload,
        )
    }

    /// Score feedback carrying the points already stored on `player`.
    pub fn score_feedback(
        &self,
        game: &GameState,
        player: &PlayerState,
        breakdown: &ScoreBreakdown,
        correlation_id: Option<String>,
    ) -> OutgoingMessage {
        let id = message_id(&format!(
            "score-{}-{}",
            game.match_id, player.participant_id
        ));
        let mut payload = object(json!({
            "match_id": game.match_id,
            "league_points": player.league_points,
            "private_score": player.private_score,
            "breakdown": breakdown,
        }));
        if let Some(feedback) = &player.feedback {
            payload.insert("feedback".into(), json!(feedback));
        }
        self.q21_envelope(
            MessageType::Q21ScoreFeedback,
            id,
            player,
            game,
            correlation_id,
            payload,
        )
    }

    /// MATCH_RESULT_REPORT for a finished, aborted or cancelled game.
    pub fn match_result(&self, result: &GameResult, league_manager_email: &str) -> OutgoingMessage {
        let id = message_id(&format!("result-{}", result.match_id));
        let scores: Vec<Value> = match result.status {
            MatchStatus::Cancelled => Vec::new(),
            _ => result.scores().iter().map(|s| json!(s)).collect(),
        };
        let mut payload = object(json!({
            "match_id": result.match_id,
            "status": result.status.as_str(),
            "winner_id": result.winner_id,
            "is_draw": result.is_draw,
            "scores": scores,
        }));
        if let Some(reason) = &result.abort_reason {
            payload.insert("abort_reason".into(), json!(reason));
        }
        if let Some(snapshot) = &result.player_states {
            payload.insert("player_states".into(), json!(snapshot));
        }
        if let Some(missing) = &result.missing_player {
            payload.insert("single_player_mode".into(), json!(true));
            payload.insert("missing_player".into(), json!(missing.slot.report_label()));
            payload.insert("missing_player_email".into(), json!(missing.email));
            payload.insert("missing_reason".into(), json!("MALFUNCTION"));
        }
        self.league_envelope(
            MessageType::MatchResultReport,
            id,
            league_manager_email,
            &result.season_id,
            Some(result.round_id.clone()),
            Some(result.game_id.clone()),
            None,
            payload,
        )
    }

    pub fn registration_request(
        &self,
        league_manager_email: &str,
        group_id: &str,
        display_name: &str,
        correlation_id: Option<String>,
    ) -> OutgoingMessage {
        let id = message_id("reg");
        let payload = object(json!({
            "season_id": self.season_id,
            "user_id": group_id,
            "participant_id": self.referee_id,
            "display_name": display_name,
        }));
        self.league_envelope(
            MessageType::SeasonRegistrationRequest,
            id,
            league_manager_email,
            &self.season_id,
            None,
            None,
            correlation_id,
            payload,
        )
    }

    pub fn group_assignment_ack(
        &self,
        league_manager_email: &str,
        group_id: &str,
        assignments_received: usize,
        correlation_id: Option<String>,
    ) -> OutgoingMessage {
        let id = message_id("assign-ack");
        let payload = object(json!({
            "status": "acknowledged",
            "referee_id": self.referee_id,
            "group_id": group_id,
            "season_id": self.season_id,
            "assignments_received": assignments_received,
        }));
        self.league_envelope(
            MessageType::ResponseGroupAssignment,
            id,
            league_manager_email,
            &self.season_id,
            None,
            None,
            correlation_id,
            payload,
        )
    }

    pub fn keep_alive_response(
        &self,
        league_manager_email: &str,
        correlation_id: Option<String>,
    ) -> OutgoingMessage {
        let id = message_id("keepalive");
        let payload = object(json!({
            "referee_id": self.referee_id,
            "status": "alive",
        }));
        self.league_envelope(
            MessageType::ResponseKeepAlive,
            id,
            league_manager_email,
            &self.season_id,
            None,
            None,
            correlation_id,
            payload,
        )
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
