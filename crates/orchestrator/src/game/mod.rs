//! Per-game state machine.
//!
//! One [`GameEngine`] owns a single game's phase and both players'
//! progress. Each inbound player message goes through the same gate:
//! known sender, not already handled, and a phase that accepts it. A
//! message failing any check is dropped with a log line and produces no
//! state change and no outgoing message.

mod context;
mod questions;
mod report;
mod scoring;
mod snapshot;
mod warmup;

pub use context::RefereeContext;
pub use snapshot::snapshot_of;

use protocol::{short_hex, EnvelopeBuilder, MessageType, OutgoingMessage, PlayerMessage};
use referee_core::{GameParameters, GamePhase, GameState, MissingPlayer, PlayerSlot, PlayerState};
use tracing::{info, warn};

use crate::callbacks::FALLBACK_WARMUP_QUESTION;
use crate::executor::CallbackExecutor;
use context::ContextBuilder;

/// Collaborators every game of one referee shares.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub envelopes: EnvelopeBuilder,
    pub executor: CallbackExecutor,
    pub referee: RefereeContext,
    pub league_manager_email: String,
}

#[derive(Debug)]
pub struct GameEngine {
    state: GameState,
    setup: GameSetup,
}

impl GameEngine {
    pub fn new(params: &GameParameters, setup: GameSetup) -> Self {
        let mut state = GameState::from_parameters(params, setup.envelopes.league_id.clone());
        state.auth_token = format!("tok_{}", short_hex());
        Self { state, setup }
    }

    /// Runs the game with only the player who checked in.
    pub fn with_missing_player(mut self, missing: MissingPlayer) -> Self {
        self.state.missing_player = Some(missing);
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn game_id(&self) -> &str {
        &self.state.game_id
    }

    pub fn round_number(&self) -> u32 {
        self.state.round_number
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn is_complete(&self) -> bool {
        self.state.phase == GamePhase::MatchReported
    }

    fn contexts(&self) -> ContextBuilder<'_> {
        ContextBuilder {
            referee: &self.setup.referee,
            executor: &self.setup.executor,
            state: &self.state,
        }
    }

    fn player(&self, slot: PlayerSlot) -> Option<&PlayerState> {
        self.state.player(slot)
    }

    fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut PlayerState> {
        self.state.player_mut(slot)
    }

    /// Sends the warmup call to every active player.
    ///
    /// A failing warmup callback does not hold the game up: the fixed
    /// fallback question is sent instead.
    pub async fn start(&mut self) -> Vec<OutgoingMessage> {
        let ctx = self.contexts().warmup();
        let question = match self.setup.executor.warmup_question(ctx).await {
            Ok(question) => question,
            Err(e) => {
                warn!(
                    game_id = %self.state.game_id,
                    error = %e,
                    "Warmup question callback failed, using fallback question"
                );
                FALLBACK_WARMUP_QUESTION.to_string()
            }
        };

        let outgoing: Vec<OutgoingMessage> = self
            .state
            .active_slots()
            .into_iter()
            .filter_map(|slot| self.player(slot))
            .map(|player| self.setup.envelopes.warmup_call(&self.state, player, &question))
            .collect();

        self.state.advance_phase(GamePhase::WarmupSent);
        info!(
            game_id = %self.state.game_id,
            round = self.state.round_number,
            players = outgoing.len(),
            "Warmup calls sent"
        );
        outgoing
    }

    /// Routes a gated player message to its handler.
    pub async fn handle(&mut self, message: &PlayerMessage) -> Vec<OutgoingMessage> {
        match message.message_type {
            MessageType::Q21WarmupResponse => self.on_warmup_response(message).await,
            MessageType::Q21QuestionsBatch => self.on_questions(message).await,
            MessageType::Q21GuessSubmission => self.on_guess(message).await,
            other => {
                warn!(
                    game_id = %self.state.game_id,
                    message_type = %other,
                    "Message type not handled by game engine"
                );
                Vec::new()
            }
        }
    }

    /// Whether `message` would pass the sender, duplicate and phase
    /// guards right now.
    pub fn accepts(&self, message: &PlayerMessage) -> bool {
        self.check(message).is_ok()
    }

    /// Resolves the sender and applies the duplicate and phase guards.
    fn admit(&self, message: &PlayerMessage) -> Option<PlayerSlot> {
        match self.check(message) {
            Ok(slot) => Some(slot),
            Err(reason) => {
                info!(
                    game_id = %self.state.game_id,
                    message_type = %message.message_type,
                    sender = %message.sender_email,
                    phase = ?self.state.phase,
                    reason,
                    "Player message dropped"
                );
                None
            }
        }
    }

    fn check(&self, message: &PlayerMessage) -> Result<PlayerSlot, &'static str> {
        let gate = Gate::for_type(message.message_type).ok_or("not a game message")?;
        let slot = self
            .state
            .slot_of(&message.sender_email)
            .ok_or("unknown sender")?;
        if self.player(slot).is_some_and(gate.done) {
            return Err("duplicate");
        }
        if !gate.phases.contains(&self.state.phase) {
            return Err("wrong phase");
        }
        Ok(slot)
    }
}

/// Duplicate marker and accepted phases for one player message kind.
struct Gate {
    done: fn(&PlayerState) -> bool,
    phases: &'static [GamePhase],
}

impl Gate {
    const WARMUP: Gate = Gate {
        done: |p| p.warmup_answer.is_some(),
        phases: &[GamePhase::WarmupSent],
    };
    const QUESTIONS: Gate = Gate {
        done: |p| p.answers_sent,
        phases: &[GamePhase::RoundStarted, GamePhase::QuestionsCollecting],
    };
    const GUESS: Gate = Gate {
        done: |p| p.score_sent,
        phases: &[GamePhase::AnswersSent, GamePhase::GuessesCollecting],
    };

    fn for_type(message_type: MessageType) -> Option<&'static Gate> {
        match message_type {
            MessageType::Q21WarmupResponse => Some(&Self::WARMUP),
            MessageType::Q21QuestionsBatch => Some(&Self::QUESTIONS),
            MessageType::Q21GuessSubmission => Some(&Self::GUESS),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use anyhow::anyhow;
    use protocol::EnvelopeBuilder;
    use referee_core::{Answer, Feedback, GameParameters, Participant, ScoreBreakdown};
    use serde_json::{json, Value};

    use super::{GameSetup, RefereeContext};
    use crate::callbacks::*;
    use crate::executor::CallbackExecutor;

    /// Scriptable decision module that counts scoring calls.
    #[derive(Default)]
    pub struct TestAi {
        pub fail_warmup: bool,
        pub fail_round_info: bool,
        pub fail_answers: bool,
        pub fail_scoring: bool,
        pub score_calls: AtomicUsize,
    }

    impl TestAi {
        pub fn score_calls(&self) -> usize {
            self.score_calls.load(Ordering::SeqCst)
        }
    }

    impl RefereeAi for TestAi {
        fn warmup_question(&self, _ctx: &WarmupContext) -> anyhow::Result<WarmupQuestion> {
            if self.fail_warmup {
                return Err(anyhow!("warmup unavailable"));
            }
            Ok(WarmupQuestion::new("What is the capital of France?"))
        }

        fn round_start_info(&self, _ctx: &RoundStartContext) -> anyhow::Result<RoundStartInfo> {
            if self.fail_round_info {
                return Err(anyhow!("no books today"));
            }
            Ok(BookInfo {
                book_name: "The Great Gatsby".into(),
                book_hint: "A novel about the American Dream".into(),
                association_word: "color".into(),
            })
        }

        fn answers(&self, ctx: &AnswersContext) -> anyhow::Result<AnswersOutput> {
            if self.fail_answers {
                return Err(anyhow!("cannot answer"));
            }
            Ok(AnswersOutput::new(
                ctx.dynamic
                    .questions
                    .iter()
                    .map(|q| Answer::new(q.question_number, "B"))
                    .collect(),
            ))
        }

        fn score_feedback(&self, ctx: &ScoreContext) -> anyhow::Result<ScoreOutput> {
            self.score_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_scoring {
                return Err(anyhow!("scorer crashed"));
            }
            let words = vec!["word"; 160].join(" ");
            let points = if ctx.dynamic.player_id == "P1" { 3 } else { 1 };
            Ok(ScoreOutput {
                league_points: points,
                private_score: 20.0 * f64::from(points),
                breakdown: ScoreBreakdown::default(),
                feedback: Some(Feedback {
                    opening_sentence: words.clone(),
                    associative_word: words,
                }),
            })
        }
    }

    pub fn setup(ai: Arc<TestAi>) -> GameSetup {
        GameSetup {
            envelopes: EnvelopeBuilder::new("ref@test.com", "REF01", "L01", "S01"),
            executor: CallbackExecutor::new(ai),
            referee: RefereeContext {
                referee_id: "REF01".into(),
                ..Default::default()
            },
            league_manager_email: "lm@test.com".into(),
        }
    }

    pub fn params() -> GameParameters {
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

    pub fn message(message_type: &str, sender: &str, payload: Value) -> protocol::PlayerMessage {
        protocol::parse_player_message(&json!({
            "message_type": message_type,
            "message_id": format!("{message_type}-{sender}"),
            "sender": {"email": sender},
            "game_id": "0101001",
            "payload": payload,
        }))
        .unwrap()
    }

    pub fn warmup(sender: &str) -> protocol::PlayerMessage {
        message("Q21WARMUPRESPONSE", sender, json!({"answer": "Paris"}))
    }

    pub fn questions(sender: &str) -> protocol::PlayerMessage {
        let questions: Vec<Value> = (1..=20)
            .map(|n| {
                json!({
                    "question_number": n,
                    "question_text": format!("Question {n}?"),
                    "options": {"A": "a", "B": "b", "C": "c", "D": "d"},
                })
            })
            .collect();
        message("Q21QUESTIONSBATCH", sender, json!({"questions": questions}))
    }

    pub fn guess(sender: &str) -> protocol::PlayerMessage {
        message(
            "Q21GUESSSUBMISSION",
            sender,
            json!({
                "opening_sentence": "In my younger and more vulnerable years.",
                "sentence_justification": "The narrator looks back.",
                "associative_word": "green",
                "word_justification": "The light at the dock.",
                "confidence": 0.8,
            }),
        )
    }
}
