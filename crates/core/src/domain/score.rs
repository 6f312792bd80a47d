use serde::{Deserialize, Serialize};

/// Four-component breakdown of a private score, each in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub opening_sentence_score: f64,
    pub sentence_justification_score: f64,
    pub associative_word_score: f64,
    pub word_justification_score: f64,
}

impl ScoreBreakdown {
    pub fn components(&self) -> [(&'static str, f64); 4] {
        [
            ("opening_sentence_score", self.opening_sentence_score),
            ("sentence_justification_score", self.sentence_justification_score),
            ("associative_word_score", self.associative_word_score),
            ("word_justification_score", self.word_justification_score),
        ]
    }
}

/// Free-text feedback sent back to a player with their score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feedback {
    pub opening_sentence: String,
    pub associative_word: String,
}

/// A player's final submission in a game.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerGuess {
    pub opening_sentence: String,
    pub sentence_justification: String,
    pub associative_word: String,
    pub word_justification: String,
    pub confidence: Option<f64>,
}

/// One multiple-choice question asked by a player.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Question {
    pub question_number: u32,
    pub question_text: String,
    pub options: std::collections::BTreeMap<String, String>,
}

/// The referee's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_number: u32,
    pub answer: String,
}

impl Answer {
    pub fn new(question_number: u32, answer: impl Into<String>) -> Self {
        Self {
            question_number,
            answer: answer.into(),
        }
    }
}
