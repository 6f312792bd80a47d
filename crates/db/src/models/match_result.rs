use referee_core::{MatchResult, MatchStatus, PlayerScore};

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchResultRow {
    pub season_id: String,
    pub round_id: String,
    pub match_id: String,
    pub game_id: String,
    pub status: String,
    pub winner_id: Option<String>,
    pub is_draw: bool,
    pub player1_id: String,
    pub player1_email: String,
    pub player1_points: i64,
    pub player1_score: f64,
    pub player2_id: String,
    pub player2_email: String,
    pub player2_points: i64,
    pub player2_score: f64,
    pub abort_reason: Option<String>,
    pub completed_at: i64,
    pub reported_at: i64,
}

fn score(id: String, email: String, points: i64, private_score: f64) -> PlayerScore {
    PlayerScore {
        participant_id: id,
        email,
        league_points: u8::try_from(points).unwrap_or_default(),
        private_score,
        feedback: None,
        score_reason: None,
    }
}

impl MatchResultRow {
    pub fn into_domain(self) -> MatchResult {
        MatchResult {
            season_id: self.season_id,
            round_id: self.round_id,
            match_id: self.match_id,
            game_id: self.game_id,
            status: MatchStatus::parse(&self.status).unwrap_or_default(),
            winner_id: self.winner_id,
            is_draw: self.is_draw,
            player1: score(
                self.player1_id,
                self.player1_email,
                self.player1_points,
                self.player1_score,
            ),
            player2: score(
                self.player2_id,
                self.player2_email,
                self.player2_points,
                self.player2_score,
            ),
            abort_reason: self.abort_reason,
            completed_at: timestamp_to_datetime(self.completed_at),
            reported_at: timestamp_to_datetime(self.reported_at),
        }
    }
}

impl From<&MatchResult> for MatchResultRow {
    fn from(r: &MatchResult) -> Self {
        Self {
            season_id: r.season_id.clone(),
            round_id: r.round_id.clone(),
            match_id: r.match_id.clone(),
            game_id: r.game_id.clone(),
            status: r.status.as_str().to_string(),
            winner_id: r.winner_id.clone(),
            is_draw: r.is_draw,
            player1_id: r.player1.participant_id.clone(),
            player1_email: r.player1.email.clone(),
            player1_points: i64::from(r.player1.league_points),
            player1_score: r.player1.private_score,
            player2_id: r.player2.participant_id.clone(),
            player2_email: r.player2.email.clone(),
            player2_points: i64::from(r.player2.league_points),
            player2_score: r.player2.private_score,
            abort_reason: r.abort_reason.clone(),
            completed_at: datetime_to_timestamp(r.completed_at),
            reported_at: datetime_to_timestamp(r.reported_at),
        }
    }
}
