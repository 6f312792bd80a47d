use serde::{Deserialize, Serialize};

use super::assignment::Participant;
use super::score::{Feedback, PlayerGuess, Question};

/// Position of a game in its fixed exchange sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    #[default]
    Idle,
    WarmupSent,
    WarmupComplete,
    RoundStarted,
    QuestionsCollecting,
    AnswersSent,
    GuessesCollecting,
    MatchReported,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::WarmupSent => "WARMUP_SENT",
            Self::WarmupComplete => "WARMUP_COMPLETE",
            Self::RoundStarted => "ROUND_STARTED",
            Self::QuestionsCollecting => "QUESTIONS_COLLECTING",
            Self::AnswersSent => "ANSWERS_SENT",
            Self::GuessesCollecting => "GUESSES_COLLECTING",
            Self::MatchReported => "MATCH_REPORTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IDLE" => Some(Self::Idle),
            "WARMUP_SENT" => Some(Self::WarmupSent),
            "WARMUP_COMPLETE" => Some(Self::WarmupComplete),
            "ROUND_STARTED" => Some(Self::RoundStarted),
            "QUESTIONS_COLLECTING" => Some(Self::QuestionsCollecting),
            "ANSWERS_SENT" => Some(Self::AnswersSent),
            "GUESSES_COLLECTING" => Some(Self::GuessesCollecting),
            "MATCH_REPORTED" => Some(Self::MatchReported),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MatchReported)
    }
}

/// Which side of the match a player occupies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    Player1,
    Player2,
}

impl PlayerSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player1 => "player1",
            Self::Player2 => "player2",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "player1" => Some(Self::Player1),
            "player2" => Some(Self::Player2),
            _ => None,
        }
    }

    /// Label used in match reports.
    pub fn report_label(&self) -> &'static str {
        match self {
            Self::Player1 => "PLAYER_A",
            Self::Player2 => "PLAYER_B",
        }
    }
}

/// Immutable per-game configuration handed from the season layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameParameters {
    pub player1: Participant,
    pub player2: Participant,
    pub season_id: String,
    pub game_id: String,
    pub match_id: String,
    pub round_id: String,
    pub round_number: u32,
}

/// A player the league reported as absent before the game started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingPlayer {
    pub slot: PlayerSlot,
    pub email: String,
}

/// One participant's progress through a game.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub email: String,
    pub participant_id: String,
    pub warmup_answer: Option<String>,
    pub warmup_message_id: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub questions_message_id: Option<String>,
    pub answers_sent: bool,
    pub guess: Option<PlayerGuess>,
    pub guess_message_id: Option<String>,
    pub score_sent: bool,
    pub league_points: u8,
    pub private_score: f64,
    pub feedback: Option<Feedback>,
}

impl PlayerState {
    pub fn new(participant: &Participant) -> Self {
        Self {
            email: participant.email.clone(),
            participant_id: participant.id.clone(),
            ..Default::default()
        }
    }

    pub fn matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }

    /// Submitted a guess that has not been scored yet.
    pub fn awaiting_score(&self) -> bool {
        self.guess.is_some() && !self.score_sent
    }
}

/// Mutable live state of the single active game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub game_id: String,
    pub match_id: String,
    pub season_id: String,
    pub league_id: String,
    pub round_id: String,
    pub round_number: u32,
    pub phase: GamePhase,
    pub player1: Option<PlayerState>,
    pub player2: Option<PlayerState>,
    pub book_name: String,
    pub book_hint: String,
    pub association_word: String,
    pub auth_token: String,
    pub missing_player: Option<MissingPlayer>,
}

impl GameState {
    pub fn from_parameters(params: &GameParameters, league_id: impl Into<String>) -> Self {
        Self {
            game_id: params.game_id.clone(),
            match_id: params.match_id.clone(),
            season_id: params.season_id.clone(),
            league_id: league_id.into(),
            round_id: params.round_id.clone(),
            round_number: params.round_number,
            phase: GamePhase::Idle,
            player1: Some(PlayerState::new(&params.player1)),
            player2: Some(PlayerState::new(&params.player2)),
            book_name: String::new(),
            book_hint: String::new(),
            association_word: String::new(),
            auth_token: String::new(),
            missing_player: None,
        }
    }

    pub fn player(&self, slot: PlayerSlot) -> Option<&PlayerState> {
        match slot {
            PlayerSlot::Player1 => self.player1.as_ref(),
            PlayerSlot::Player2 => self.player2.as_ref(),
        }
    }

    pub fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut PlayerState> {
        match slot {
            PlayerSlot::Player1 => self.player1.as_mut(),
            PlayerSlot::Player2 => self.player2.as_mut(),
        }
    }

    /// Resolves a sender to the slot of an active (not missing) player.
    pub fn slot_of(&self, email: &str) -> Option<PlayerSlot> {
        self.active_slots()
            .into_iter()
            .find(|slot| self.player(*slot).is_some_and(|p| p.matches(email)))
    }

    pub fn is_missing(&self, slot: PlayerSlot) -> bool {
        self.missing_player.as_ref().is_some_and(|m| m.slot == slot)
    }

    /// Slots of players that take part in the exchange.
    pub fn active_slots(&self) -> Vec<PlayerSlot> {
        [PlayerSlot::Player1, PlayerSlot::Player2]
            .into_iter()
            .filter(|slot| self.player(*slot).is_some() && !self.is_missing(*slot))
            .collect()
    }

    fn all_active(&self, done: impl Fn(&PlayerState) -> bool) -> bool {
        let slots = self.active_slots();
        !slots.is_empty()
            && slots
                .iter()
                .all(|slot| self.player(*slot).is_some_and(&done))
    }

    pub fn all_warmups_received(&self) -> bool {
        self.all_active(|p| p.warmup_answer.is_some())
    }

    pub fn all_answers_sent(&self) -> bool {
        self.all_active(|p| p.answers_sent)
    }

    pub fn all_scores_sent(&self) -> bool {
        self.all_active(|p| p.score_sent)
    }

    pub fn advance_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GameParameters {
        GameParameters {
            player1: Participant::new("P1", "p1@test.com"),
            player2: Participant::new("P2", "p2@test.com"),
            season_id: "S01".into(),
            game_id: "0101001".into(),
            match_id: "0101001".into(),
            round_id: "ROUND_1".into(),
            round_number: 1,
        }
    }

    #[test]
    fn test_phase_round_trip() {
        assert_eq!(GamePhase::parse("ANSWERS_SENT"), Some(GamePhase::AnswersSent));
        assert_eq!(GamePhase::MatchReported.as_str(), "MATCH_REPORTED");
        assert!(GamePhase::MatchReported.is_terminal());
        assert!(!GamePhase::GuessesCollecting.is_terminal());
    }

    #[test]
    fn test_guesses_collecting_leads_straight_to_report() {
        let phases = [
            GamePhase::Idle,
            GamePhase::WarmupSent,
            GamePhase::WarmupComplete,
            GamePhase::RoundStarted,
            GamePhase::QuestionsCollecting,
            GamePhase::AnswersSent,
            GamePhase::GuessesCollecting,
            GamePhase::MatchReported,
        ];
        for phase in phases {
            assert_eq!(GamePhase::parse(phase.as_str()), Some(phase));
        }
        assert_eq!(GamePhase::parse("SCORING_COMPLETE"), None);
    }

    #[test]
    fn test_state_from_parameters() {
        let state = GameState::from_parameters(&params(), "L01");
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.league_id, "L01");
        assert_eq!(state.player1.as_ref().unwrap().participant_id, "P1");
        assert_eq!(state.slot_of("P2@TEST.COM"), Some(PlayerSlot::Player2));
        assert_eq!(state.slot_of("stranger@test.com"), None);
    }

    #[test]
    fn test_milestones_require_every_active_player() {
        let mut state = GameState::from_parameters(&params(), "L01");
        state.player1.as_mut().unwrap().warmup_answer = Some("4".into());
        assert!(!state.all_warmups_received());
        state.player2.as_mut().unwrap().warmup_answer = Some("4".into());
        assert!(state.all_warmups_received());
    }

    #[test]
    fn test_missing_player_is_excluded() {
        let mut state = GameState::from_parameters(&params(), "L01");
        state.missing_player = Some(MissingPlayer {
            slot: PlayerSlot::Player2,
            email: "p2@test.com".into(),
        });
        assert_eq!(state.active_slots(), vec![PlayerSlot::Player1]);
        assert_eq!(state.slot_of("p2@test.com"), None);

        state.player1.as_mut().unwrap().score_sent = true;
        assert!(state.all_scores_sent());
    }

    #[test]
    fn test_no_players_never_completes() {
        let mut state = GameState::from_parameters(&params(), "L01");
        state.player1 = None;
        state.player2 = None;
        assert!(!state.all_scores_sent());
    }
}
