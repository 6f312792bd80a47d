use serde::{Deserialize, Serialize};

/// A player as addressed by the league: logical id plus mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub email: String,
}

impl Participant {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// One scheduled match this referee is responsible for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundAssignment {
    pub season_id: String,
    pub round_number: u32,
    pub round_id: String,
    pub match_id: String,
    pub game_id: String,
    pub group_id: String,
    pub player1: Participant,
    pub player2: Participant,
    pub status: AssignmentStatus,
}

impl RoundAssignment {
    pub fn involves(&self, email: &str) -> bool {
        self.player1.email.eq_ignore_ascii_case(email) || self.player2.email.eq_ignore_ascii_case(email)
    }
}
