use protocol::{OutgoingMessage, PlayerMessage};
use referee_core::GamePhase;
use serde_json::Value;
use tracing::{info, warn};

use super::GameEngine;

impl GameEngine {
    /// Stores a warmup answer. Once every active player has answered,
    /// asks for the book setup and sends the round start.
    pub(super) async fn on_warmup_response(
        &mut self,
        message: &PlayerMessage,
    ) -> Vec<OutgoingMessage> {
        let Some(slot) = self.admit(message) else {
            return Vec::new();
        };

        let answer = match message.payload.get("answer") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        if let Some(player) = self.player_mut(slot) {
            info!(participant = %player.participant_id, answer = %answer, "Warmup answer received");
            player.warmup_answer = Some(answer);
            player.warmup_message_id = message.message_id.clone();
        }

        if !self.state.all_warmups_received() {
            return Vec::new();
        }
        self.state.advance_phase(GamePhase::WarmupComplete);

        let ctx = self.contexts().round_start();
        let book = match self.setup.executor.round_start_info(ctx).await {
            Ok(book) => book,
            Err(e) => {
                warn!(
                    game_id = %self.state.game_id,
                    error = %e,
                    "Round start callback failed, game stalled"
                );
                return Vec::new();
            }
        };
        self.state.book_name = book.book_name;
        self.state.book_hint = book.book_hint;
        self.state.association_word = book.association_word;

        let outgoing: Vec<OutgoingMessage> = self
            .state
            .active_slots()
            .into_iter()
            .filter_map(|slot| self.player(slot))
            .map(|player| self.setup.envelopes.round_start(&self.state, player))
            .collect();

        self.state.advance_phase(GamePhase::RoundStarted);
        info!(
            game_id = %self.state.game_id,
            book = %self.state.book_name,
            "Round started"
        );
        outgoing
    }
}
