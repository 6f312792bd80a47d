use events::RefereeEvent;
use protocol::OutgoingMessage;
use referee_core::{SeasonEvent, SeasonState};
use tracing::{info, warn};

use super::SeasonOrchestrator;

impl SeasonOrchestrator {
    /// Force-completes the active game with whatever state it reached.
    ///
    /// Players holding an unscored guess are scored (zero on callback
    /// failure); players who never guessed keep zero points and the
    /// scoring callback is not run for them. The report carries status
    /// `aborted`, the reason and a per-player snapshot taken before any
    /// abort scoring.
    pub async fn abort_current_game(&mut self, reason: &str) -> Vec<OutgoingMessage> {
        let Some(mut game) = self.game.take() else {
            return Vec::new();
        };
        warn!(game_id = %game.game_id(), phase = ?game.phase(), reason, "Aborting game");

        let snapshot = game.snapshot();
        let mut outgoing = game.score_pending().await;
        let result = game.aborted_result(reason, snapshot);
        outgoing.push(game.report(&result));

        self.finish_game(&result).await;
        if self.machine.state() == SeasonState::InGame {
            self.apply(SeasonEvent::GameAborted);
        }
        info!(
            game_id = %result.game_id,
            scored_feedback = outgoing.len() - 1,
            "Abort report built"
        );
        self.events.emit(RefereeEvent::GameAborted {
            game_id: result.game_id,
            reason: reason.to_string(),
        });
        outgoing
    }
}
