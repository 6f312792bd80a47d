use std::collections::BTreeMap;

use events::RefereeEvent;
use protocol::{Envelope, OutgoingMessage};
use referee_core::{
    AssignmentStatus, GameId, GameParameters, Participant, RoundAssignment, Season, SeasonEvent,
    SeasonStatus,
};
use serde_json::Value;
use tracing::{info, warn};

use super::SeasonOrchestrator;

/// One row of an assignment table broadcast.
#[derive(Debug, Clone)]
struct TableEntry {
    role: String,
    email: String,
    group_id: String,
}

impl SeasonOrchestrator {
    pub(super) async fn on_start_season(&mut self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        let season_id = envelope
            .payload_str("season_id")
            .or(envelope.season_id.as_deref())
            .unwrap_or(self.config.season_id.as_str())
            .to_string();
        let league_id = envelope
            .league_id
            .clone()
            .unwrap_or_else(|| self.config.league_id.clone());
        info!(season_id = %season_id, league_id = %league_id, "Season starting");

        self.setup.envelopes.season_id = season_id.clone();
        self.setup.envelopes.league_id = league_id.clone();
        if let Err(e) = self
            .repos
            .seasons
            .upsert(&Season::new(&season_id, &league_id))
            .await
        {
            warn!(season_id = %season_id, error = %e, "Failed to persist season");
        }
        self.apply(SeasonEvent::SeasonStart);

        vec![self.setup.envelopes.registration_request(
            &self.config.league_manager_email,
            &self.config.group_id,
            &self.config.display_name,
            Some(envelope.message_id.clone()),
        )]
    }

    pub(super) async fn on_registration_response(
        &mut self,
        envelope: &Envelope,
    ) -> Vec<OutgoingMessage> {
        match envelope.payload_str("status") {
            Some("accepted") => {
                info!(season_id = %self.season_id(), "Registration accepted");
                self.force(SeasonEvent::RegistrationAccepted);
                self.set_season_status(SeasonStatus::Registered).await;
            }
            Some("rejected") => {
                warn!(
                    season_id = %self.season_id(),
                    reason = envelope.payload_str("reason").unwrap_or(""),
                    "Registration rejected"
                );
                self.apply(SeasonEvent::RegistrationRejected);
                self.set_season_status(SeasonStatus::Rejected).await;
            }
            other => warn!(status = ?other, "Unknown registration status"),
        }
        Vec::new()
    }

    /// Stores the games this referee officiates and acknowledges the table.
    pub(super) async fn on_assignment_table(
        &mut self,
        envelope: &Envelope,
    ) -> Vec<OutgoingMessage> {
        let season_id = envelope
            .payload_str("season_id")
            .map(str::to_string)
            .unwrap_or_else(|| self.season_id().to_string());

        let mut games: BTreeMap<String, Vec<TableEntry>> = BTreeMap::new();
        for item in envelope
            .payload
            .get("assignments")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let field = |name: &str| item.get(name).and_then(Value::as_str).unwrap_or("");
            let game_id = field("game_id");
            if game_id.is_empty() {
                continue;
            }
            games.entry(game_id.to_string()).or_default().push(TableEntry {
                role: field("role").to_string(),
                email: field("email").to_string(),
                group_id: field("group_id").to_string(),
            });
        }
        let total = games.len();

        let mut stored = 0;
        for (game_id, entries) in &games {
            let Some(assignment) = self.own_assignment(&season_id, game_id, entries) else {
                continue;
            };
            match self.repos.assignments.upsert(&assignment).await {
                Ok(()) => stored += 1,
                Err(e) => warn!(game_id = %game_id, error = %e, "Failed to store assignment"),
            }
        }
        info!(
            season_id = %season_id,
            total_games = total,
            assigned = stored,
            "Assignment table processed"
        );

        if stored > 0 && self.game.is_none() {
            self.force(SeasonEvent::AssignmentReceived);
        }
        vec![self.setup.envelopes.group_assignment_ack(
            &self.config.league_manager_email,
            &self.config.group_id,
            stored,
            Some(envelope.message_id.clone()),
        )]
    }

    /// The assignment for `game_id` when its referee entry is this referee.
    fn own_assignment(
        &self,
        season_id: &str,
        game_id: &str,
        entries: &[TableEntry],
    ) -> Option<RoundAssignment> {
        let by_role = |role: &str| entries.iter().find(|e| e.role == role);
        let referee = by_role("referee")?;
        let is_ours = referee.email.eq_ignore_ascii_case(&self.config.referee_email)
            || (!self.config.group_id.is_empty() && referee.group_id == self.config.group_id);
        if !is_ours {
            return None;
        }

        let (Some(p1), Some(p2)) = (by_role("player1"), by_role("player2")) else {
            warn!(game_id, "Assigned game is missing a player entry");
            return None;
        };
        let Some(round_number) = GameId::round_of(game_id) else {
            warn!(game_id, "Assigned game has a malformed id");
            return None;
        };
        Some(RoundAssignment {
            season_id: season_id.to_string(),
            round_number,
            round_id: format!("ROUND_{round_number}"),
            match_id: game_id.to_string(),
            game_id: game_id.to_string(),
            group_id: referee.group_id.clone(),
            player1: Participant::new(&p1.group_id, &p1.email),
            player2: Participant::new(&p2.group_id, &p2.email),
            status: AssignmentStatus::Pending,
        })
    }

    pub(super) async fn on_new_round(&mut self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        let Some(round_number) = envelope.payload_u32("round_number") else {
            warn!(
                round_number = ?envelope.payload.get("round_number"),
                "New round broadcast without a usable round number"
            );
            return Vec::new();
        };
        let round_id = envelope
            .payload_str("round_id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("ROUND_{round_number}"));

        let assignment = match self
            .repos
            .assignments
            .find_by_round(self.season_id(), round_number)
            .await
        {
            Ok(Some(assignment)) => assignment,
            Ok(None) => {
                info!(round = round_number, "No assignment for this round");
                return Vec::new();
            }
            Err(e) => {
                warn!(round = round_number, error = %e, "Assignment lookup failed");
                return Vec::new();
            }
        };

        let season_id = envelope
            .season_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.season_id().to_string());
        let params = GameParameters {
            player1: assignment.player1,
            player2: assignment.player2,
            season_id,
            game_id: assignment.game_id.clone(),
            match_id: assignment.game_id,
            round_id,
            round_number,
        };
        let lookup_table: Option<Vec<String>> = envelope
            .payload
            .get("participant_lookup_table")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            });
        info!(
            round = round_number,
            game_id = %params.game_id,
            "New round"
        );
        self.start_checked_round(params, lookup_table.as_deref())
            .await
    }

    pub(super) async fn on_end_round(&mut self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        let round_number = envelope.payload_u32("round_number");
        let active_round = self.game.as_ref().map(|g| g.round_number());
        match (round_number, active_round) {
            (Some(ended), Some(active)) if ended == active => {
                self.abort_current_game("round ended").await
            }
            _ => {
                info!(round = ?round_number, active = ?active_round, "Round ended, nothing to abort");
                Vec::new()
            }
        }
    }

    pub(super) async fn on_end_season(&mut self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        info!(season_id = %self.season_id(), message_type = %envelope.message_type, "Season ending");
        let outgoing = self.abort_current_game("season ended").await;
        self.apply(SeasonEvent::SeasonEnd);
        self.set_season_status(SeasonStatus::Completed).await;
        outgoing
    }

    pub(super) fn on_keep_alive(&self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        vec![self.setup.envelopes.keep_alive_response(
            &self.config.league_manager_email,
            Some(envelope.message_id.clone()),
        )]
    }

    pub(super) fn on_critical_pause(&mut self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        let reason = envelope
            .payload_str("reason")
            .unwrap_or("unspecified")
            .to_string();
        warn!(reason = %reason, "Critical pause");
        let before = self.machine.state();
        self.machine.pause();
        self.emit_transition(before, SeasonEvent::Pause);
        self.pause_reason = Some(reason.clone());
        self.events.emit(RefereeEvent::SeasonPaused { reason });
        Vec::new()
    }

    pub(super) fn on_critical_continue(&mut self) -> Vec<OutgoingMessage> {
        let before = self.machine.state();
        let state = self.machine.resume();
        self.emit_transition(before, SeasonEvent::Continue);
        self.pause_reason = None;
        info!(state = state.as_str(), "Critical continue");
        self.events.emit(RefereeEvent::SeasonResumed {
            state: state.as_str().to_string(),
        });
        Vec::new()
    }

    pub(super) async fn on_critical_reset(&mut self) -> Vec<OutgoingMessage> {
        warn!("Critical reset");
        let outgoing = self.abort_current_game("critical reset").await;
        self.apply(SeasonEvent::Reset);
        self.pause_reason = None;
        self.deadlines.clear();
        match self.repos.assignments.clear().await {
            Ok(removed) => info!(removed, "Assignments cleared"),
            Err(e) => warn!(error = %e, "Failed to clear assignments"),
        }
        outgoing
    }

    pub(super) fn on_round_results(&self, envelope: &Envelope) -> Vec<OutgoingMessage> {
        let round = envelope.payload_u32("round_number");
        for result in envelope
            .payload
            .get("results")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let match_id = result.get("match_id").and_then(Value::as_str).unwrap_or("?");
            let winner = result.get("winner_id").and_then(Value::as_str).unwrap_or("DRAW");
            info!(round = ?round, match_id, winner, "Round result");
        }
        let standings = envelope
            .payload
            .get("standings")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        info!(round = ?round, standings, "Round results received");
        Vec::new()
    }
}
