//! Referee lifecycle event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping every event with an id and timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: RefereeEvent,
}

impl EventEnvelope {
    pub fn new(event: RefereeEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefereeEvent {
    /// Season state machine moved
    #[serde(rename = "season.state_changed")]
    SeasonStateChanged {
        from: String,
        to: String,
        trigger: String,
    },

    #[serde(rename = "season.paused")]
    SeasonPaused { reason: String },

    #[serde(rename = "season.resumed")]
    SeasonResumed { state: String },

    #[serde(rename = "game.started")]
    GameStarted { game_id: String, round_number: u32 },

    #[serde(rename = "game.completed")]
    GameCompleted {
        game_id: String,
        status: String,
        winner_id: Option<String>,
        is_draw: bool,
    },

    /// Active game force-completed with a partial result
    #[serde(rename = "game.aborted")]
    GameAborted { game_id: String, reason: String },

    /// Both players missing; no game was played
    #[serde(rename = "game.cancelled")]
    GameCancelled { game_id: String },

    /// A broadcast id seen before was ignored
    #[serde(rename = "broadcast.duplicate")]
    BroadcastDuplicate {
        broadcast_id: String,
        message_type: String,
    },

    #[serde(rename = "message.rejected")]
    MessageRejected {
        message_type: String,
        sender: String,
        reason: String,
    },

    #[serde(rename = "message.sent")]
    MessageSent {
        message_type: String,
        recipient: String,
        delivered: bool,
    },
}

impl RefereeEvent {
    /// Wire name of the event, e.g. `game.aborted`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SeasonStateChanged { .. } => "season.state_changed",
            Self::SeasonPaused { .. } => "season.paused",
            Self::SeasonResumed { .. } => "season.resumed",
            Self::GameStarted { .. } => "game.started",
            Self::GameCompleted { .. } => "game.completed",
            Self::GameAborted { .. } => "game.aborted",
            Self::GameCancelled { .. } => "game.cancelled",
            Self::BroadcastDuplicate { .. } => "broadcast.duplicate",
            Self::MessageRejected { .. } => "message.rejected",
            Self::MessageSent { .. } => "message.sent",
        }
    }

    pub fn game_id(&self) -> Option<&str> {
        match self {
            Self::GameStarted { game_id, .. }
            | Self::GameCompleted { game_id, .. }
            | Self::GameAborted { game_id, .. }
            | Self::GameCancelled { game_id } => Some(game_id),
            _ => None,
        }
    }
}
