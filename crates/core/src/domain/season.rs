use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Season-level lifecycle state of one referee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonState {
    #[default]
    InitStartState,
    WaitingForConfirmation,
    WaitingForAssignment,
    Running,
    InGame,
    Paused,
    Completed,
}

impl SeasonState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InitStartState => "INIT_START_STATE",
            Self::WaitingForConfirmation => "WAITING_FOR_CONFIRMATION",
            Self::WaitingForAssignment => "WAITING_FOR_ASSIGNMENT",
            Self::Running => "RUNNING",
            Self::InGame => "IN_GAME",
            Self::Paused => "PAUSED",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INIT_START_STATE" => Some(Self::InitStartState),
            "WAITING_FOR_CONFIRMATION" => Some(Self::WaitingForConfirmation),
            "WAITING_FOR_ASSIGNMENT" => Some(Self::WaitingForAssignment),
            "RUNNING" => Some(Self::Running),
            "IN_GAME" => Some(Self::InGame),
            "PAUSED" => Some(Self::Paused),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Events that drive [`SeasonState`] transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonEvent {
    SeasonStart,
    RegistrationAccepted,
    RegistrationRejected,
    AssignmentReceived,
    RoundStart,
    GameComplete,
    GameAborted,
    SeasonEnd,
    Pause,
    Continue,
    Reset,
}

impl SeasonEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeasonStart => "SEASON_START",
            Self::RegistrationAccepted => "REGISTRATION_ACCEPTED",
            Self::RegistrationRejected => "REGISTRATION_REJECTED",
            Self::AssignmentReceived => "ASSIGNMENT_RECEIVED",
            Self::RoundStart => "ROUND_START",
            Self::GameComplete => "GAME_COMPLETE",
            Self::GameAborted => "GAME_ABORTED",
            Self::SeasonEnd => "SEASON_END",
            Self::Pause => "PAUSE",
            Self::Continue => "CONTINUE",
            Self::Reset => "RESET",
        }
    }
}

/// Persisted status of a season record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    #[default]
    Pending,
    Registered,
    Active,
    Completed,
    Rejected,
}

impl SeasonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Registered => "registered",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "registered" => Some(Self::Registered),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub season_id: String,
    pub league_id: String,
    pub status: SeasonStatus,
    pub created_at: DateTime<Utc>,
    pub registered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Season {
    pub fn new(season_id: impl Into<String>, league_id: impl Into<String>) -> Self {
        Self {
            season_id: season_id.into(),
            league_id: league_id.into(),
            status: SeasonStatus::default(),
            created_at: Utc::now(),
            registered_at: None,
            completed_at: None,
        }
    }

    pub fn register(&mut self) {
        self.status = SeasonStatus::Registered;
        self.registered_at = Some(Utc::now());
    }

    pub fn complete(&mut self) {
        self.status = SeasonStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn reject(&mut self) {
        self.status = SeasonStatus::Rejected;
        self.completed_at = Some(Utc::now());
    }
}
