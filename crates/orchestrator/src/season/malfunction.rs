use chrono::Utc;
use events::RefereeEvent;
use protocol::OutgoingMessage;
use referee_core::{
    GameParameters, GameResult, MatchStatus, MissingPlayer, Participant, PlayerScore, PlayerSlot,
};
use tracing::{info, warn};

use super::SeasonOrchestrator;

/// Check-in outcome for a game's two players.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malfunction {
    Normal,
    SinglePlayer(MissingPlayer),
    Cancelled,
}

/// Compares the emails that checked in (case-insensitive) with a game's
/// players. No lookup table means nobody is reported missing.
pub fn detect_malfunction(
    lookup_table: Option<&[String]>,
    player1: &Participant,
    player2: &Participant,
) -> Malfunction {
    let Some(table) = lookup_table else {
        return Malfunction::Normal;
    };
    let present = |p: &Participant| table.iter().any(|e| e.eq_ignore_ascii_case(&p.email));

    match (present(player1), present(player2)) {
        (true, true) => Malfunction::Normal,
        (false, false) => Malfunction::Cancelled,
        (false, true) => Malfunction::SinglePlayer(MissingPlayer {
            slot: PlayerSlot::Player1,
            email: player1.email.clone(),
        }),
        (true, false) => Malfunction::SinglePlayer(MissingPlayer {
            slot: PlayerSlot::Player2,
            email: player2.email.clone(),
        }),
    }
}

impl SeasonOrchestrator {
    /// Starts a round whose lookup table may report missing players.
    pub(super) async fn start_checked_round(
        &mut self,
        params: GameParameters,
        lookup_table: Option<&[String]>,
    ) -> Vec<OutgoingMessage> {
        match detect_malfunction(lookup_table, &params.player1, &params.player2) {
            Malfunction::Normal => self.start_round(params).await,
            Malfunction::SinglePlayer(missing) => {
                warn!(
                    game_id = %params.game_id,
                    missing = %missing.email,
                    "Player missing, running single-player game"
                );
                self.launch_game(params, Some(missing)).await
            }
            Malfunction::Cancelled => self.cancel_game(params).await,
        }
    }

    /// Reports a game neither player checked in for. No game is created.
    async fn cancel_game(&mut self, params: GameParameters) -> Vec<OutgoingMessage> {
        let mut outgoing = Vec::new();
        if self.game.is_some() {
            outgoing.extend(self.abort_current_game("superseded by new round").await);
        }
        warn!(game_id = %params.game_id, "Both players missing, game cancelled");

        let entry = |p: &Participant| PlayerScore {
            participant_id: p.id.clone(),
            email: p.email.clone(),
            ..Default::default()
        };
        let result = GameResult {
            game_id: params.game_id.clone(),
            match_id: params.match_id.clone(),
            round_id: params.round_id.clone(),
            season_id: params.season_id.clone(),
            player1: entry(&params.player1),
            player2: entry(&params.player2),
            winner_id: None,
            is_draw: true,
            status: MatchStatus::Cancelled,
            abort_reason: None,
            player_states: None,
            missing_player: None,
            completed_at: Utc::now(),
        };
        outgoing.push(
            self.setup
                .envelopes
                .match_result(&result, &self.setup.league_manager_email),
        );
        self.finish_game(&result).await;
        info!(game_id = %params.game_id, "Cancellation reported");
        self.events.emit(RefereeEvent::GameCancelled {
            game_id: params.game_id,
        });
        outgoing
    }
}
