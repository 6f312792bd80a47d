use chrono::Utc;
use protocol::OutgoingMessage;
use referee_core::{
    determine_winner, GameResult, MatchStatus, PlayerScore, PlayerSlot, PlayerState,
    TECHNICAL_LOSS_MALFUNCTION,
};

use super::GameEngine;

impl GameEngine {
    /// Outcome of a naturally finished game.
    pub fn result(&self) -> GameResult {
        let status = if self.state.missing_player.is_some() {
            MatchStatus::CompletedSinglePlayer
        } else {
            MatchStatus::Completed
        };
        self.build_result(status, None)
    }

    /// Outcome of a force-completed game. The snapshot must be taken
    /// before any abort scoring runs.
    pub fn aborted_result(&self, reason: &str, snapshot: referee_core::GameSnapshot) -> GameResult {
        let mut result = self.build_result(MatchStatus::Aborted, Some(reason.to_string()));
        result.player_states = Some(snapshot);
        result
    }

    pub fn report(&self, result: &GameResult) -> OutgoingMessage {
        self.setup
            .envelopes
            .match_result(result, &self.setup.league_manager_email)
    }

    fn build_result(&self, status: MatchStatus, abort_reason: Option<String>) -> GameResult {
        let (winner_id, is_draw) =
            determine_winner(self.state.player1.as_ref(), self.state.player2.as_ref());
        GameResult {
            game_id: self.state.game_id.clone(),
            match_id: self.state.match_id.clone(),
            round_id: self.state.round_id.clone(),
            season_id: self.state.season_id.clone(),
            player1: self.score_entry(PlayerSlot::Player1),
            player2: self.score_entry(PlayerSlot::Player2),
            winner_id,
            is_draw,
            status,
            abort_reason,
            player_states: None,
            missing_player: self.state.missing_player.clone(),
            completed_at: Utc::now(),
        }
    }

    fn score_entry(&self, slot: PlayerSlot) -> PlayerScore {
        let mut score = self
            .player(slot)
            .map(PlayerScore::from)
            .unwrap_or_else(|| PlayerScore::from(&PlayerState::default()));
        if self.state.is_missing(slot) {
            score.league_points = 0;
            score.private_score = 0.0;
            score.score_reason = Some(TECHNICAL_LOSS_MALFUNCTION.to_string());
        }
        score
    }
}
