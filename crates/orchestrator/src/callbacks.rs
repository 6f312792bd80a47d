//! The four decision points a referee delegates to pluggable business
//! logic, with their input contexts and typed outputs.

use protocol::ANSWER_CHOICES;
use referee_core::{Answer, Feedback, PlayerGuess, Question, ScoreBreakdown};
use serde::{Deserialize, Serialize};

use crate::config::CallbackDeadlines;

/// Decision callbacks supplied by the referee's owner.
///
/// Methods run on a blocking worker under a deadline. Returning `Err` or
/// panicking is treated as a callback fault, never as a process failure.
pub trait RefereeAi: Send + Sync + 'static {
    fn warmup_question(&self, ctx: &WarmupContext) -> anyhow::Result<WarmupQuestion>;

    fn round_start_info(&self, ctx: &RoundStartContext) -> anyhow::Result<RoundStartInfo>;

    fn answers(&self, ctx: &AnswersContext) -> anyhow::Result<AnswersOutput>;

    fn score_feedback(&self, ctx: &ScoreContext) -> anyhow::Result<ScoreOutput>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    WarmupQuestion,
    RoundStartInfo,
    Answers,
    ScoreFeedback,
}

impl CallbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WarmupQuestion => "warmup_question",
            Self::RoundStartInfo => "round_start_info",
            Self::Answers => "answers",
            Self::ScoreFeedback => "score_feedback",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::WarmupQuestion => "Generate a simple question to verify player connectivity",
            Self::RoundStartInfo => "Select a book, write a hint, and choose an association word",
            Self::Answers => {
                "Answer each multiple-choice question with A, B, C, D, or 'Not Relevant'"
            }
            Self::ScoreFeedback => {
                "Score the player's guess and provide 150-200 word feedback for each component"
            }
        }
    }

    pub fn required_output_fields(&self) -> &'static [&'static str] {
        match self {
            Self::WarmupQuestion => &["warmup_question"],
            Self::RoundStartInfo => &["book_name", "book_hint", "association_word"],
            Self::Answers => &["answers"],
            Self::ScoreFeedback => &["league_points", "private_score", "breakdown", "feedback"],
        }
    }

    pub fn default_deadline_seconds(&self) -> u64 {
        match self {
            Self::WarmupQuestion => 30,
            Self::RoundStartInfo => 60,
            Self::Answers => 120,
            Self::ScoreFeedback => 180,
        }
    }

    pub fn deadline_seconds(&self, overrides: &CallbackDeadlines) -> u64 {
        let custom = match self {
            Self::WarmupQuestion => overrides.warmup_question,
            Self::RoundStartInfo => overrides.round_start_info,
            Self::Answers => overrides.answers,
            Self::ScoreFeedback => overrides.score_feedback,
        };
        custom.unwrap_or_else(|| self.default_deadline_seconds())
    }
}

impl std::fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a callback handed to it with every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub description: String,
    pub required_output_fields: Vec<String>,
    pub deadline_seconds: u64,
}

impl ServiceDefinition {
    pub fn new(kind: CallbackKind, deadline_seconds: u64) -> Self {
        Self {
            name: kind.as_str().to_string(),
            description: kind.description().to_string(),
            required_output_fields: kind
                .required_output_fields()
                .iter()
                .map(|f| f.to_string())
                .collect(),
            deadline_seconds,
        }
    }
}

/// Input of every callback: per-call data plus the service definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackContext<D> {
    pub dynamic: D,
    pub service: ServiceDefinition,
}

/// Identifiers present in every callback context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameContext {
    pub season_id: String,
    pub league_id: String,
    pub game_id: String,
    pub match_id: String,
    pub referee_id: String,
    pub round_number: u32,
    pub round_id: String,
    pub assignment_table_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: Option<String>,
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupDynamic {
    #[serde(flatten)]
    pub game: GameContext,
    pub player_a: PlayerInfo,
    pub player_b: PlayerInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStartDynamic {
    #[serde(flatten)]
    pub game: GameContext,
    pub player_a: PlayerInfo,
    pub player_b: PlayerInfo,
}

/// The book setup as players see it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookInfo {
    pub book_name: String,
    pub book_hint: String,
    pub association_word: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswersDynamic {
    #[serde(flatten)]
    pub game: GameContext,
    pub player_id: String,
    pub player_email: String,
    #[serde(flatten)]
    pub book: BookInfo,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDynamic {
    #[serde(flatten)]
    pub game: GameContext,
    pub player_id: String,
    pub player_email: String,
    #[serde(flatten)]
    pub book: BookInfo,
    pub actual_opening_sentence: Option<String>,
    pub actual_associative_word: Option<String>,
    pub player_guess: PlayerGuess,
}

pub type WarmupContext = CallbackContext<WarmupDynamic>;
pub type RoundStartContext = CallbackContext<RoundStartDynamic>;
pub type AnswersContext = CallbackContext<AnswersDynamic>;
pub type ScoreContext = CallbackContext<ScoreDynamic>;

/// Range and length checks a callback result must pass before use.
pub trait CallbackOutput {
    /// Every violated constraint, empty when the output is usable.
    fn violations(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarmupQuestion {
    pub warmup_question: String,
}

impl WarmupQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            warmup_question: question.into(),
        }
    }
}

impl CallbackOutput for WarmupQuestion {
    fn violations(&self) -> Vec<String> {
        let len = self.warmup_question.chars().count();
        if len < 5 {
            vec![format!("warmup_question must be at least 5 characters, got {len}")]
        } else {
            Vec::new()
        }
    }
}

pub type RoundStartInfo = BookInfo;

impl CallbackOutput for BookInfo {
    fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.book_name.trim().is_empty() {
            errors.push("book_name must not be empty".to_string());
        }
        let hint_len = self.book_hint.chars().count();
        if !(10..=200).contains(&hint_len) {
            errors.push(format!("book_hint must be 10-200 characters, got {hint_len}"));
        }
        if self.association_word.trim().is_empty() {
            errors.push("association_word must not be empty".to_string());
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswersOutput {
    pub answers: Vec<Answer>,
}

impl AnswersOutput {
    pub fn new(answers: Vec<Answer>) -> Self {
        Self { answers }
    }
}

impl CallbackOutput for AnswersOutput {
    fn violations(&self) -> Vec<String> {
        if self.answers.is_empty() {
            return vec!["answers must not be empty".to_string()];
        }
        let mut errors = Vec::new();
        for (i, answer) in self.answers.iter().enumerate() {
            if answer.question_number < 1 {
                errors.push(format!("answers[{i}].question_number must be >= 1"));
            }
            if !ANSWER_CHOICES.contains(&answer.answer.as_str()) {
                errors.push(format!(
                    "answers[{i}].answer must be one of {ANSWER_CHOICES:?}, got '{}'",
                    answer.answer
                ));
            }
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub league_points: u8,
    pub private_score: f64,
    pub breakdown: ScoreBreakdown,
    #[serde(default)]
    pub feedback: Option<Feedback>,
}

impl ScoreOutput {
    /// Result recorded when scoring could not run.
    pub fn zero() -> Self {
        Self {
            league_points: 0,
            private_score: 0.0,
            breakdown: ScoreBreakdown::default(),
            feedback: None,
        }
    }
}

impl CallbackOutput for ScoreOutput {
    fn violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.league_points > 3 {
            errors.push(format!("league_points must be 0-3, got {}", self.league_points));
        }
        if !(0.0..=100.0).contains(&self.private_score) {
            errors.push(format!("private_score must be 0-100, got {}", self.private_score));
        }
        for (name, value) in self.breakdown.components() {
            if !(0.0..=100.0).contains(&value) {
                errors.push(format!("breakdown.{name} must be 0-100, got {value}"));
            }
        }
        errors
    }
}

pub const FALLBACK_WARMUP_QUESTION: &str = "What is 2 + 2?";
