use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::game::{MissingPlayer, PlayerState};
use super::score::Feedback;

/// Score reason attached to a player who never showed up.
pub const TECHNICAL_LOSS_MALFUNCTION: &str = "TECHNICAL_LOSS_MALFUNCTION";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MatchStatus {
    #[default]
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "aborted")]
    Aborted,
    #[serde(rename = "COMPLETED_SINGLE_PLAYER")]
    CompletedSinglePlayer,
    #[serde(rename = "CANCELLED_ALL_PLAYERS_MALFUNCTION")]
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::CompletedSinglePlayer => "COMPLETED_SINGLE_PLAYER",
            Self::Cancelled => "CANCELLED_ALL_PLAYERS_MALFUNCTION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            "COMPLETED_SINGLE_PLAYER" => Some(Self::CompletedSinglePlayer),
            "CANCELLED_ALL_PLAYERS_MALFUNCTION" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerScore {
    pub participant_id: String,
    pub email: String,
    pub league_points: u8,
    pub private_score: f64,
    pub feedback: Option<Feedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_reason: Option<String>,
}

impl From<&PlayerState> for PlayerScore {
    fn from(player: &PlayerState) -> Self {
        Self {
            participant_id: player.participant_id.clone(),
            email: player.email.clone(),
            league_points: player.league_points,
            private_score: player.private_score,
            feedback: player.feedback.clone(),
            score_reason: None,
        }
    }
}

/// How far one participant got, for abort reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub email: String,
    pub participant_id: String,
    pub phase_reached: String,
    pub scored: bool,
    pub last_actor: String,
}

impl PlayerSnapshot {
    /// Placeholder for an empty player slot.
    pub fn not_initialized() -> Self {
        Self {
            email: String::new(),
            participant_id: String::new(),
            phase_reached: "not_initialized".to_string(),
            scored: false,
            last_actor: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub game_id: String,
    pub phase: String,
    pub player1: PlayerSnapshot,
    pub player2: PlayerSnapshot,
}

/// Outcome handed back to the season layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub game_id: String,
    pub match_id: String,
    pub round_id: String,
    pub season_id: String,
    pub player1: PlayerScore,
    pub player2: PlayerScore,
    pub winner_id: Option<String>,
    pub is_draw: bool,
    pub status: MatchStatus,
    pub abort_reason: Option<String>,
    pub player_states: Option<GameSnapshot>,
    pub missing_player: Option<MissingPlayer>,
    pub completed_at: DateTime<Utc>,
}

impl GameResult {
    pub fn scores(&self) -> [&PlayerScore; 2] {
        [&self.player1, &self.player2]
    }
}

/// A reported outcome as kept in the season ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub season_id: String,
    pub round_id: String,
    pub match_id: String,
    pub game_id: String,
    pub status: MatchStatus,
    pub winner_id: Option<String>,
    pub is_draw: bool,
    pub player1: PlayerScore,
    pub player2: PlayerScore,
    pub abort_reason: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub reported_at: DateTime<Utc>,
}

impl From<&GameResult> for MatchResult {
    fn from(result: &GameResult) -> Self {
        Self {
            season_id: result.season_id.clone(),
            round_id: result.round_id.clone(),
            match_id: result.match_id.clone(),
            game_id: result.game_id.clone(),
            status: result.status,
            winner_id: result.winner_id.clone(),
            is_draw: result.is_draw,
            player1: result.player1.clone(),
            player2: result.player2.clone(),
            abort_reason: result.abort_reason.clone(),
            completed_at: result.completed_at,
            reported_at: Utc::now(),
        }
    }
}

/// Strictly more league points wins; equal points or an absent player
/// is a draw.
pub fn determine_winner(
    player1: Option<&PlayerState>,
    player2: Option<&PlayerState>,
) -> (Option<String>, bool) {
    let (Some(p1), Some(p2)) = (player1, player2) else {
        return (None, true);
    };
    if p1.league_points > p2.league_points {
        (Some(p1.participant_id.clone()), false)
    } else if p2.league_points > p1.league_points {
        (Some(p2.participant_id.clone()), false)
    } else {
        (None, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, points: u8) -> PlayerState {
        PlayerState {
            participant_id: id.to_string(),
            email: format!("{id}@test.com"),
            league_points: points,
            ..Default::default()
        }
    }

    #[test]
    fn test_strictly_greater_wins() {
        let (a, b) = (player("A", 3), player("B", 1));
        assert_eq!(determine_winner(Some(&a), Some(&b)), (Some("A".into()), false));
        assert_eq!(determine_winner(Some(&b), Some(&a)), (Some("A".into()), false));
    }

    #[test]
    fn test_equal_points_draw() {
        let (a, b) = (player("A", 2), player("B", 2));
        assert_eq!(determine_winner(Some(&a), Some(&b)), (None, true));
    }

    #[test]
    fn test_absent_player_draw() {
        let a = player("A", 3);
        assert_eq!(determine_winner(Some(&a), None), (None, true));
        assert_eq!(determine_winner(None, None), (None, true));
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&MatchStatus::Cancelled).unwrap(),
            "\"CANCELLED_ALL_PLAYERS_MALFUNCTION\""
        );
        assert_eq!(MatchStatus::parse("aborted"), Some(MatchStatus::Aborted));
    }

    #[test]
    fn test_score_from_player() {
        let mut p = player("A", 2);
        p.private_score = 71.5;
        let score = PlayerScore::from(&p);
        assert_eq!(score.league_points, 2);
        assert_eq!(score.private_score, 71.5);
        assert!(score.score_reason.is_none());
    }
}
