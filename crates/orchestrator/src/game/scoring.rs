use protocol::{OutgoingMessage, PlayerMessage};
use referee_core::{GamePhase, PlayerGuess, PlayerSlot};
use serde_json::Value;
use tracing::{info, warn};

use super::GameEngine;
use crate::callbacks::ScoreOutput;

impl GameEngine {
    /// Scores one player's guess. The match result report follows the
    /// last score.
    pub(super) async fn on_guess(&mut self, message: &PlayerMessage) -> Vec<OutgoingMessage> {
        let Some(slot) = self.admit(message) else {
            return Vec::new();
        };

        let guess: PlayerGuess = serde_json::from_value(Value::Object(message.payload.clone()))
            .unwrap_or_else(|e| {
                warn!(sender = %message.sender_email, error = %e, "Guess fields unreadable, scoring empty guess");
                PlayerGuess::default()
            });
        if let Some(player) = self.player_mut(slot) {
            player.guess = Some(guess);
            player.guess_message_id = message.message_id.clone();
        }

        let mut outgoing: Vec<OutgoingMessage> = self.score_player(slot).await.into_iter().collect();

        if self.state.all_scores_sent() {
            self.state.advance_phase(GamePhase::MatchReported);
            let result = self.result();
            outgoing.push(self.report(&result));
            info!(
                game_id = %self.state.game_id,
                winner = ?result.winner_id,
                is_draw = result.is_draw,
                "Match complete"
            );
        } else {
            self.state.advance_phase(GamePhase::GuessesCollecting);
        }
        outgoing
    }

    /// Scores every player holding an unscored guess, without touching
    /// the phase. Used when a game is force-completed.
    pub async fn score_pending(&mut self) -> Vec<OutgoingMessage> {
        let pending: Vec<PlayerSlot> = self
            .state
            .active_slots()
            .into_iter()
            .filter(|slot| self.player(*slot).is_some_and(|p| p.awaiting_score()))
            .collect();

        let mut outgoing = Vec::new();
        for slot in pending {
            outgoing.extend(self.score_player(slot).await);
        }
        outgoing
    }

    /// Runs the scoring callback for a player with a stored guess, falling
    /// back to a zero score, and builds the feedback message.
    async fn score_player(&mut self, slot: PlayerSlot) -> Option<OutgoingMessage> {
        let player = self.player(slot)?.clone();
        let guess = player.guess.clone()?;

        let ctx = self.contexts().score(&player, guess);
        let score = match self.setup.executor.score_feedback(ctx).await {
            Ok(score) => score,
            Err(e) => {
                warn!(
                    game_id = %self.state.game_id,
                    participant = %player.participant_id,
                    error = %e,
                    "Scoring callback failed, using zero score"
                );
                ScoreOutput::zero()
            }
        };

        let player = self.player_mut(slot)?;
        player.league_points = score.league_points;
        player.private_score = score.private_score;
        player.feedback = score.feedback;
        player.score_sent = true;
        let player = player.clone();

        info!(
            game_id = %self.state.game_id,
            participant = %player.participant_id,
            league_points = player.league_points,
            private_score = player.private_score,
            "Player scored"
        );
        Some(self.setup.envelopes.score_feedback(
            &self.state,
            &player,
            &score.breakdown,
            player.guess_message_id.clone(),
        ))
    }
}
