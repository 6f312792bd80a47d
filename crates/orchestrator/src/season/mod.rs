//! Season-level orchestration.
//!
//! [`SeasonOrchestrator`] owns the season state machine, the broadcast
//! ledger, the referee's stored assignments and at most one live
//! [`GameEngine`]. League broadcasts are applied at most once per
//! broadcast id; player messages reach the engine only when they carry
//! the active game's id.

mod abort;
mod handlers;
mod malfunction;
#[cfg(test)]
mod tests;

pub use malfunction::{detect_malfunction, Malfunction};

use std::collections::HashSet;
use std::sync::Arc;

use db::{AssignmentRepository, BroadcastRepository, MatchResultRepository, SeasonRepository};
use events::{EventBus, RefereeEvent};
use protocol::{parse_player_message, Envelope, EnvelopeBuilder, MessageType, OutgoingMessage};
use referee_core::{
    AssignmentStatus, GameId, GameParameters, GameResult, MatchResult, MissingPlayer, SeasonEvent,
    SeasonState, SeasonStatus, SEASON_PLACEHOLDER_GAME_ID,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::callbacks::RefereeAi;
use crate::config::RefereeConfig;
use crate::deadlines::{DeadlinePhase, DeadlineTracker};
use crate::error::{OrchestratorError, Result};
use crate::executor::CallbackExecutor;
use crate::game::{GameEngine, GameSetup, RefereeContext};
use crate::state_machine::SeasonStateMachine;

struct Repositories {
    seasons: SeasonRepository,
    assignments: AssignmentRepository,
    results: MatchResultRepository,
    broadcasts: BroadcastRepository,
}

pub struct SeasonOrchestrator {
    config: RefereeConfig,
    machine: SeasonStateMachine,
    setup: GameSetup,
    game: Option<GameEngine>,
    deadlines: DeadlineTracker,
    seen_broadcasts: HashSet<String>,
    pause_reason: Option<String>,
    repos: Repositories,
    events: EventBus,
}

impl SeasonOrchestrator {
    /// Builds an orchestrator on a migrated pool, loading the broadcast
    /// ledger so ids seen before a restart stay no-ops.
    pub async fn new(
        config: RefereeConfig,
        ai: Arc<dyn RefereeAi>,
        pool: SqlitePool,
    ) -> Result<Self> {
        config.validate()?;

        let executor =
            CallbackExecutor::new(ai).with_deadlines(config.callback_deadlines.clone());
        let setup = GameSetup {
            envelopes: EnvelopeBuilder::new(
                &config.referee_email,
                &config.referee_id,
                &config.league_id,
                &config.season_id,
            ),
            executor,
            referee: RefereeContext {
                referee_id: config.referee_id.clone(),
                assignment_table_id: config.assignment_table_id.clone(),
                actual_opening_sentence: config.actual_opening_sentence.clone(),
                actual_associative_word: config.actual_associative_word.clone(),
            },
            league_manager_email: config.league_manager_email.clone(),
        };

        let repos = Repositories {
            seasons: SeasonRepository::new(pool.clone()),
            assignments: AssignmentRepository::new(pool.clone()),
            results: MatchResultRepository::new(pool.clone()),
            broadcasts: BroadcastRepository::new(pool),
        };
        let seen_broadcasts: HashSet<String> =
            repos.broadcasts.all_ids().await?.into_iter().collect();
        info!(
            referee_id = %config.referee_id,
            known_broadcasts = seen_broadcasts.len(),
            "Season orchestrator ready"
        );

        Ok(Self {
            config,
            machine: SeasonStateMachine::new(),
            setup,
            game: None,
            deadlines: DeadlineTracker::new(),
            seen_broadcasts,
            pause_reason: None,
            repos,
            events: EventBus::new(),
        })
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &RefereeConfig {
        &self.config
    }

    pub fn state(&self) -> SeasonState {
        self.machine.state()
    }

    pub fn season_id(&self) -> &str {
        &self.setup.envelopes.season_id
    }

    pub fn pause_reason(&self) -> Option<&str> {
        self.pause_reason.as_deref()
    }

    pub fn active_game(&self) -> Option<&GameEngine> {
        self.game.as_ref()
    }

    pub fn deadlines(&self) -> &DeadlineTracker {
        &self.deadlines
    }

    /// Applies one league control broadcast, at most once per broadcast id.
    pub async fn handle_control_message(&mut self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        let Some(message_type) =
            MessageType::parse(&envelope.message_type).filter(MessageType::is_league_control)
        else {
            warn!(message_type = %envelope.message_type, "Not a league control message");
            return Vec::new();
        };

        let broadcast_id = envelope.broadcast_id().to_string();
        if self.seen_broadcasts.contains(&broadcast_id) {
            info!(broadcast_id = %broadcast_id, message_type = %message_type, "Duplicate broadcast ignored");
            self.events.emit(RefereeEvent::BroadcastDuplicate {
                broadcast_id,
                message_type: message_type.to_string(),
            });
            return Vec::new();
        }

        if self.machine.is_paused() && !Self::allowed_while_paused(message_type) {
            info!(
                message_type = %message_type,
                reason = ?self.pause_reason,
                "Season paused, broadcast deferred"
            );
            return Vec::new();
        }

        debug!(broadcast_id = %broadcast_id, message_type = %message_type, "Handling broadcast");
        let outgoing = match message_type {
            MessageType::BroadcastStartSeason => self.on_start_season(envelope).await,
            MessageType::SeasonRegistrationResponse => {
                self.on_registration_response(envelope).await
            }
            MessageType::BroadcastAssignmentTable => self.on_assignment_table(envelope).await,
            MessageType::BroadcastNewLeagueRound => self.on_new_round(envelope).await,
            MessageType::BroadcastEndLeagueRound => self.on_end_round(envelope).await,
            MessageType::BroadcastEndSeason | MessageType::LeagueCompleted => {
                self.on_end_season(envelope).await
            }
            MessageType::BroadcastKeepAlive => self.on_keep_alive(envelope),
            MessageType::BroadcastCriticalPause => self.on_critical_pause(envelope),
            MessageType::BroadcastCriticalContinue => self.on_critical_continue(),
            MessageType::BroadcastCriticalReset => self.on_critical_reset().await,
            MessageType::BroadcastRoundResults => self.on_round_results(envelope),
            other => {
                debug!(message_type = %other, "No season rule for message");
                Vec::new()
            }
        };

        self.record_broadcast(&broadcast_id, message_type).await;
        outgoing
    }

    fn allowed_while_paused(message_type: MessageType) -> bool {
        matches!(
            message_type,
            MessageType::BroadcastKeepAlive
                | MessageType::BroadcastCriticalPause
                | MessageType::BroadcastCriticalContinue
                | MessageType::BroadcastCriticalReset
        )
    }

    async fn record_broadcast(&mut self, broadcast_id: &str, message_type: MessageType) {
        self.seen_broadcasts.insert(broadcast_id.to_string());
        if let Err(e) = self
            .repos
            .broadcasts
            .record(broadcast_id, message_type.as_str())
            .await
        {
            warn!(broadcast_id, error = %e, "Failed to persist broadcast id");
        }
    }

    /// Forwards a player message to the active game.
    ///
    /// Rejected when the season is paused, no game is running, or the
    /// message names a different game. Only a message the game accepts
    /// clears the sender's response deadline.
    pub async fn route_player_message(&mut self, body: &Value) -> Result<Vec<OutgoingMessage>> {
        let message = parse_player_message(body)?;

        if self.machine.is_paused() {
            return Err(OrchestratorError::Paused {
                event: message.message_type.to_string(),
            });
        }
        let Some(game) = self.game.as_mut() else {
            return Err(OrchestratorError::NoActiveGame);
        };
        if game.game_id() != message.game_id {
            return Err(OrchestratorError::game_mismatch(game.game_id(), &message.game_id));
        }

        let accepted = game.accepts(&message);
        let outgoing = game.handle(&message).await;
        let complete = game.is_complete();
        if accepted {
            self.deadlines.cancel(&message.sender_email);
        }
        self.track_deadlines(&outgoing);

        if complete {
            self.complete_game().await;
        }
        Ok(outgoing)
    }

    /// Starts the game for a round. The same round again is a no-op; a
    /// different active game is aborted first and its report comes before
    /// the new warmup calls.
    pub async fn start_round(&mut self, params: GameParameters) -> Vec<OutgoingMessage> {
        self.launch_game(params, None).await
    }

    async fn launch_game(
        &mut self,
        params: GameParameters,
        missing: Option<MissingPlayer>,
    ) -> Vec<OutgoingMessage> {
        let mut outgoing = Vec::new();
        if let Some(game) = &self.game {
            if game.round_number() == params.round_number {
                info!(
                    game_id = %game.game_id(),
                    round = params.round_number,
                    "Round already active, start ignored"
                );
                return outgoing;
            }
            outgoing.extend(self.abort_current_game("superseded by new round").await);
        }

        let mut engine = GameEngine::new(&params, self.setup.clone());
        if let Some(missing) = missing {
            engine = engine.with_missing_player(missing);
        }
        let warmups = engine.start().await;
        self.track_deadlines(&warmups);
        outgoing.extend(warmups);

        self.force(SeasonEvent::RoundStart);
        self.mark_assignment(&params.match_id, AssignmentStatus::InProgress, Some(&params.round_id))
            .await;
        self.events.emit(RefereeEvent::GameStarted {
            game_id: params.game_id.clone(),
            round_number: params.round_number,
        });
        self.game = Some(engine);
        outgoing
    }

    /// Books a naturally finished game and returns to `RUNNING`.
    pub async fn complete_game(&mut self) {
        let Some(game) = self.game.take() else {
            return;
        };
        let result = game.result();
        info!(
            game_id = %result.game_id,
            winner = ?result.winner_id,
            is_draw = result.is_draw,
            "Game complete"
        );
        self.finish_game(&result).await;
        self.apply(SeasonEvent::GameComplete);
        self.events.emit(RefereeEvent::GameCompleted {
            game_id: result.game_id,
            status: result.status.as_str().to_string(),
            winner_id: result.winner_id,
            is_draw: result.is_draw,
        });
    }

    /// Aborts the active game when a player's response deadline passed.
    pub async fn check_timeouts(&mut self) -> Vec<OutgoingMessage> {
        if self.machine.is_paused() {
            return Vec::new();
        }
        let expired = self.deadlines.check_expired();
        let Some(first) = expired.first() else {
            return Vec::new();
        };
        if self.game.is_none() {
            self.deadlines.clear();
            return Vec::new();
        }
        warn!(phase = %first.phase, email = %first.email, "Player deadline expired");
        self.abort_current_game(&first.reason()).await
    }

    /// Game id used as log context for a message: the active game, the
    /// referee's game for a round broadcast, or a placeholder.
    pub async fn context_game_id(&self, envelope: &Envelope) -> String {
        if let Some(game) = &self.game {
            return game.game_id().to_string();
        }
        let round = MessageType::parse(&envelope.message_type)
            .filter(|t| {
                matches!(
                    t,
                    MessageType::BroadcastNewLeagueRound | MessageType::BroadcastEndLeagueRound
                )
            })
            .and_then(|_| envelope.payload_u32("round_number"));
        let Some(round) = round else {
            return SEASON_PLACEHOLDER_GAME_ID.to_string();
        };
        match self
            .repos
            .assignments
            .find_by_round(self.season_id(), round)
            .await
        {
            Ok(Some(assignment)) => assignment.game_id,
            _ => GameId::round_placeholder(round),
        }
    }

    fn track_deadlines(&mut self, outgoing: &[OutgoingMessage]) {
        for message in outgoing {
            let phase = match message.message_type() {
                Some(MessageType::Q21WarmupCall) => DeadlinePhase::Warmup,
                Some(MessageType::Q21RoundStart) => DeadlinePhase::Questions,
                Some(MessageType::Q21AnswersBatch) => DeadlinePhase::Guess,
                _ => continue,
            };
            self.deadlines
                .set(phase, &message.recipient, phase.default_seconds());
        }
    }

    /// Persists a final result and closes the assignment.
    async fn finish_game(&mut self, result: &GameResult) {
        self.deadlines.clear();
        if let Err(e) = self.repos.results.save(&MatchResult::from(result)).await {
            warn!(match_id = %result.match_id, error = %e, "Failed to persist match result");
        }
        self.mark_assignment(&result.match_id, AssignmentStatus::Completed, None)
            .await;
    }

    async fn mark_assignment(
        &self,
        match_id: &str,
        status: AssignmentStatus,
        round_id: Option<&str>,
    ) {
        if let Err(e) = self
            .repos
            .assignments
            .update_status(self.season_id(), match_id, status, round_id)
            .await
        {
            debug!(match_id, error = %e, "Assignment status not updated");
        }
    }

    async fn set_season_status(&self, status: SeasonStatus) {
        if let Err(e) = self
            .repos
            .seasons
            .update_status(self.season_id(), status)
            .await
        {
            warn!(season_id = %self.season_id(), error = %e, "Failed to update season status");
        }
    }

    /// Table transition; a rejected event is logged only.
    fn apply(&mut self, event: SeasonEvent) -> bool {
        let before = self.machine.state();
        let changed = self.machine.try_transition(event);
        self.emit_transition(before, event);
        changed
    }

    fn force(&mut self, event: SeasonEvent) {
        let before = self.machine.state();
        self.machine.transition_forced(event);
        self.emit_transition(before, event);
    }

    fn emit_transition(&self, before: SeasonState, event: SeasonEvent) {
        let after = self.machine.state();
        if before != after {
            self.events.emit(RefereeEvent::SeasonStateChanged {
                from: before.as_str().to_string(),
                to: after.as_str().to_string(),
                trigger: event.as_str().to_string(),
            });
        }
    }
}

impl std::fmt::Debug for SeasonOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeasonOrchestrator")
            .field("referee_id", &self.config.referee_id)
            .field("state", &self.machine.state())
            .field("active_game", &self.game.as_ref().map(|g| g.game_id().to_string()))
            .finish_non_exhaustive()
    }
}
