use referee_core::{SeasonEvent, SeasonState};
use tracing::{info, warn};

use crate::error::{OrchestratorError, Result};

/// Season-level lifecycle of one referee.
///
/// `RUNNING <-> IN_GAME` cycles once per game. Rejection and reset return
/// to `INIT_START_STATE` from anywhere. Pausing remembers the state it
/// left and resuming restores it.
#[derive(Debug, Clone, Default)]
pub struct SeasonStateMachine {
    state: SeasonState,
    paused_from: Option<SeasonState>,
}

impl SeasonStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SeasonState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == SeasonState::Paused
    }

    /// State to return to on resume, while paused.
    pub fn paused_from(&self) -> Option<SeasonState> {
        self.paused_from
    }

    /// Target of `event` from `from`, or `None` when the table has no entry.
    pub fn target(from: SeasonState, event: SeasonEvent) -> Option<SeasonState> {
        use SeasonEvent as E;
        use SeasonState as S;

        match (from, event) {
            (_, E::RegistrationRejected | E::Reset) => Some(S::InitStartState),
            (S::InitStartState, E::SeasonStart) => Some(S::WaitingForConfirmation),
            (S::WaitingForConfirmation, E::RegistrationAccepted) => Some(S::WaitingForAssignment),
            (S::WaitingForAssignment, E::AssignmentReceived) => Some(S::Running),
            (S::Running, E::RoundStart) => Some(S::InGame),
            (S::Running, E::SeasonEnd) => Some(S::Completed),
            (S::InGame, E::GameComplete | E::GameAborted) => Some(S::Running),
            (S::InGame, E::SeasonEnd) => Some(S::Completed),
            _ => None,
        }
    }

    pub fn can_transition(from: SeasonState, event: SeasonEvent) -> bool {
        Self::target(from, event).is_some()
    }

    pub fn validate_transition(from: SeasonState, event: SeasonEvent) -> Result<SeasonState> {
        Self::target(from, event).ok_or_else(|| OrchestratorError::InvalidTransition {
            from: from.as_str().to_string(),
            event: event.as_str().to_string(),
        })
    }

    /// Applies a table transition. While paused only `RESET` is accepted.
    pub fn transition(&mut self, event: SeasonEvent) -> Result<SeasonState> {
        if self.is_paused() && event != SeasonEvent::Reset {
            return Err(OrchestratorError::Paused {
                event: event.as_str().to_string(),
            });
        }
        let next = Self::validate_transition(self.state, event)?;
        Ok(self.move_to(next, event))
    }

    /// Like [`transition`](Self::transition) but a rejected event is only
    /// logged. Returns whether the state changed.
    pub fn try_transition(&mut self, event: SeasonEvent) -> bool {
        match self.transition(event) {
            Ok(_) => true,
            Err(e) => {
                warn!(state = self.state.as_str(), event = event.as_str(), error = %e, "Season transition rejected");
                false
            }
        }
    }

    /// Sets the table target of `event` regardless of the current state.
    ///
    /// Used for league messages that may arrive out of order. Events that
    /// have no target from any state (`PAUSE`, `CONTINUE`) are ignored.
    pub fn transition_forced(&mut self, event: SeasonEvent) -> SeasonState {
        let next = match event {
            SeasonEvent::SeasonStart => Some(SeasonState::WaitingForConfirmation),
            SeasonEvent::RegistrationAccepted => Some(SeasonState::WaitingForAssignment),
            SeasonEvent::AssignmentReceived
            | SeasonEvent::GameComplete
            | SeasonEvent::GameAborted => Some(SeasonState::Running),
            SeasonEvent::RoundStart => Some(SeasonState::InGame),
            SeasonEvent::SeasonEnd => Some(SeasonState::Completed),
            SeasonEvent::RegistrationRejected | SeasonEvent::Reset => {
                Some(SeasonState::InitStartState)
            }
            SeasonEvent::Pause | SeasonEvent::Continue => None,
        };
        match next {
            Some(next) => {
                self.paused_from = None;
                self.move_to(next, event)
            }
            None => self.state,
        }
    }

    pub fn pause(&mut self) -> SeasonState {
        if !self.is_paused() {
            self.paused_from = Some(self.state);
            self.state = SeasonState::Paused;
            info!(from = ?self.paused_from, "Season paused");
        }
        self.state
    }

    pub fn resume(&mut self) -> SeasonState {
        if let Some(previous) = self.paused_from.take() {
            self.state = previous;
            info!(state = self.state.as_str(), "Season resumed");
        }
        self.state
    }

    fn move_to(&mut self, next: SeasonState, event: SeasonEvent) -> SeasonState {
        if event == SeasonEvent::Reset {
            self.paused_from = None;
        }
        if next != self.state {
            info!(
                from = self.state.as_str(),
                to = next.as_str(),
                event = event.as_str(),
                "Season state transition"
            );
        }
        self.state = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> SeasonStateMachine {
        let mut sm = SeasonStateMachine::new();
        sm.transition(SeasonEvent::SeasonStart).unwrap();
        sm.transition(SeasonEvent::RegistrationAccepted).unwrap();
        sm.transition(SeasonEvent::AssignmentReceived).unwrap();
        sm
    }

    #[test]
    fn test_happy_path() {
        let mut sm = running();
        assert_eq!(sm.state(), SeasonState::Running);
        assert_eq!(sm.transition(SeasonEvent::RoundStart).unwrap(), SeasonState::InGame);
        assert_eq!(sm.transition(SeasonEvent::GameComplete).unwrap(), SeasonState::Running);
        assert_eq!(sm.transition(SeasonEvent::RoundStart).unwrap(), SeasonState::InGame);
        assert_eq!(sm.transition(SeasonEvent::GameAborted).unwrap(), SeasonState::Running);
        assert_eq!(sm.transition(SeasonEvent::SeasonEnd).unwrap(), SeasonState::Completed);
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!SeasonStateMachine::can_transition(
            SeasonState::InitStartState,
            SeasonEvent::RoundStart
        ));
        assert!(!SeasonStateMachine::can_transition(
            SeasonState::Completed,
            SeasonEvent::SeasonStart
        ));

        let mut sm = SeasonStateMachine::new();
        let err = sm.transition(SeasonEvent::GameComplete).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidTransition { .. }));
        assert_eq!(sm.state(), SeasonState::InitStartState);
        assert!(!sm.try_transition(SeasonEvent::AssignmentReceived));
    }

    #[test]
    fn test_rejection_and_reset_from_any_state() {
        for event in [SeasonEvent::RegistrationRejected, SeasonEvent::Reset] {
            let mut sm = running();
            sm.transition(SeasonEvent::RoundStart).unwrap();
            assert_eq!(sm.transition(event).unwrap(), SeasonState::InitStartState);
        }
    }

    #[test]
    fn test_pause_and_resume() {
        let mut sm = running();
        sm.transition(SeasonEvent::RoundStart).unwrap();
        assert_eq!(sm.pause(), SeasonState::Paused);
        assert_eq!(sm.paused_from(), Some(SeasonState::InGame));

        // second pause keeps the original state
        sm.pause();
        assert_eq!(sm.paused_from(), Some(SeasonState::InGame));

        let err = sm.transition(SeasonEvent::GameComplete).unwrap_err();
        assert!(matches!(err, OrchestratorError::Paused { .. }));

        assert_eq!(sm.resume(), SeasonState::InGame);
        assert!(sm.paused_from().is_none());
    }

    #[test]
    fn test_resume_when_not_paused_is_noop() {
        let mut sm = running();
        assert_eq!(sm.resume(), SeasonState::Running);
    }

    #[test]
    fn test_reset_while_paused_clears_pause() {
        let mut sm = running();
        sm.pause();
        assert_eq!(sm.transition(SeasonEvent::Reset).unwrap(), SeasonState::InitStartState);
        assert!(sm.paused_from().is_none());
        assert_eq!(sm.resume(), SeasonState::InitStartState);
    }

    #[test]
    fn test_forced_transition_ignores_source() {
        let mut sm = SeasonStateMachine::new();
        assert_eq!(
            sm.transition_forced(SeasonEvent::AssignmentReceived),
            SeasonState::Running
        );
        assert_eq!(sm.transition_forced(SeasonEvent::RoundStart), SeasonState::InGame);
        assert_eq!(sm.transition_forced(SeasonEvent::Pause), SeasonState::InGame);
    }
}
