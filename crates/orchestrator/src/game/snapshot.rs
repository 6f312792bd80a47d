use referee_core::{GamePhase, GameSnapshot, GameState, PlayerSnapshot, PlayerState};

use super::GameEngine;

impl GameEngine {
    /// How far each player got, for abort reports.
    pub fn snapshot(&self) -> GameSnapshot {
        snapshot_of(&self.state)
    }
}

pub fn snapshot_of(state: &GameState) -> GameSnapshot {
    let player = |p: Option<&PlayerState>| {
        p.map(|p| player_snapshot(state, p))
            .unwrap_or_else(PlayerSnapshot::not_initialized)
    };
    GameSnapshot {
        game_id: state.game_id.clone(),
        phase: state.phase.as_str().to_string(),
        player1: player(state.player1.as_ref()),
        player2: player(state.player2.as_ref()),
    }
}

fn player_snapshot(state: &GameState, player: &PlayerState) -> PlayerSnapshot {
    let phase_reached = phase_reached(state.phase, player);
    let player_acted = matches!(
        phase_reached,
        "warmup_answered" | "questions_submitted" | "guess_submitted"
    );
    PlayerSnapshot {
        email: player.email.clone(),
        participant_id: player.participant_id.clone(),
        phase_reached: phase_reached.to_string(),
        scored: player.score_sent,
        last_actor: if player_acted {
            player.participant_id.clone()
        } else {
            "referee".to_string()
        },
    }
}

/// Furthest step a player reached; the game phase decides only when the
/// player has not acted at all.
fn phase_reached(phase: GamePhase, player: &PlayerState) -> &'static str {
    if player.score_sent {
        "scored"
    } else if player.guess.is_some() {
        "guess_submitted"
    } else if player.answers_sent {
        "answers_received"
    } else if player.questions.is_some() {
        "questions_submitted"
    } else if player.warmup_answer.is_some() {
        "warmup_answered"
    } else {
        match phase {
            GamePhase::WarmupSent | GamePhase::WarmupComplete => "warmup_sent",
            GamePhase::RoundStarted | GamePhase::QuestionsCollecting => "round_started",
            _ => "idle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use referee_core::{Participant, PlayerGuess};

    fn player() -> PlayerState {
        PlayerState::new(&Participant::new("P1", "p1@test.com"))
    }

    #[test]
    fn test_furthest_step_wins() {
        let mut p = player();
        p.warmup_answer = Some("4".into());
        p.questions = Some(vec![]);
        assert_eq!(phase_reached(GamePhase::RoundStarted, &p), "questions_submitted");

        p.answers_sent = true;
        assert_eq!(phase_reached(GamePhase::AnswersSent, &p), "answers_received");

        p.guess = Some(PlayerGuess::default());
        assert_eq!(phase_reached(GamePhase::GuessesCollecting, &p), "guess_submitted");

        p.score_sent = true;
        assert_eq!(phase_reached(GamePhase::GuessesCollecting, &p), "scored");
    }

    #[test]
    fn test_idle_player_follows_game_phase() {
        let p = player();
        assert_eq!(phase_reached(GamePhase::WarmupComplete, &p), "warmup_sent");
        assert_eq!(phase_reached(GamePhase::QuestionsCollecting, &p), "round_started");
        assert_eq!(phase_reached(GamePhase::AnswersSent, &p), "idle");
        assert_eq!(phase_reached(GamePhase::Idle, &p), "idle");
    }

    #[test]
    fn test_last_actor() {
        let state = GameState {
            phase: GamePhase::WarmupSent,
            ..test_state()
        };
        let snapshot = snapshot_of(&state);
        assert_eq!(snapshot.player1.last_actor, "referee");
        assert_eq!(snapshot.player1.phase_reached, "warmup_sent");

        let mut state = state;
        if let Some(p) = state.player1.as_mut() {
            p.warmup_answer = Some("4".into());
        }
        let snapshot = snapshot_of(&state);
        assert_eq!(snapshot.player1.last_actor, "P1");
        assert_eq!(snapshot.phase, "WARMUP_SENT");
    }

    #[test]
    fn test_absent_slot_placeholder() {
        let mut state = test_state();
        state.player2 = None;
        let snapshot = snapshot_of(&state);
        assert_eq!(snapshot.player2.phase_reached, "not_initialized");
        assert_eq!(snapshot.player2.last_actor, "none");
    }

    fn test_state() -> GameState {
        GameState::from_parameters(
            &referee_core::GameParameters {
                player1: Participant::new("P1", "p1@test.com"),
                player2: Participant::new("P2", "p2@test.com"),
                season_id: "S01".into(),
                game_id: "0101001".into(),
                match_id: "0101001".into(),
                round_id: "ROUND_1".into(),
                round_number: 1,
            },
            "L01",
        )
    }
}
