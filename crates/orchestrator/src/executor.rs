use std::sync::Arc;
use std::time::Duration;

use protocol::word_count;
use referee_core::Feedback;
use thiserror::Error;
use tracing::{debug, warn};

use crate::callbacks::{
    AnswersContext, CallbackContext, CallbackKind, CallbackOutput, RefereeAi, RoundStartContext,
    RoundStartInfo, ScoreContext, ScoreOutput, ServiceDefinition, WarmupContext,
};
use crate::config::CallbackDeadlines;
use referee_core::Answer;

/// Feedback texts outside this word range cost part of the private score.
pub const FEEDBACK_WORDS: std::ops::RangeInclusive<usize> = 150..=200;

/// Share of the private score deducted per out-of-range feedback text.
pub const FEEDBACK_PENALTY: f64 = 0.05;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("{callback} timed out after {seconds}s")]
    Timeout { callback: CallbackKind, seconds: u64 },

    #[error("{callback} failed: {message}")]
    Failed {
        callback: CallbackKind,
        message: String,
    },

    #[error("{callback} panicked")]
    Panicked { callback: CallbackKind },

    #[error("{callback} returned invalid output: {}", violations.join("; "))]
    SchemaViolation {
        callback: CallbackKind,
        violations: Vec<String>,
    },
}

impl CallbackError {
    pub fn schema(callback: CallbackKind, violations: Vec<String>) -> Self {
        Self::SchemaViolation {
            callback,
            violations,
        }
    }

    pub fn callback(&self) -> CallbackKind {
        match self {
            Self::Timeout { callback, .. }
            | Self::Failed { callback, .. }
            | Self::Panicked { callback }
            | Self::SchemaViolation { callback, .. } => *callback,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Runs decision callbacks on the blocking pool under a deadline.
///
/// A callback that overruns its deadline is abandoned, not cancelled: the
/// worker may keep running in the background and its late result is
/// dropped.
#[derive(Clone)]
pub struct CallbackExecutor {
    ai: Arc<dyn RefereeAi>,
    deadlines: CallbackDeadlines,
}

impl CallbackExecutor {
    pub fn new(ai: Arc<dyn RefereeAi>) -> Self {
        Self {
            ai,
            deadlines: CallbackDeadlines::default(),
        }
    }

    pub fn with_deadlines(mut self, deadlines: CallbackDeadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    pub fn service(&self, kind: CallbackKind) -> ServiceDefinition {
        ServiceDefinition::new(kind, kind.deadline_seconds(&self.deadlines))
    }

    pub async fn warmup_question(&self, ctx: WarmupContext) -> Result<String, CallbackError> {
        let output = self
            .run(CallbackKind::WarmupQuestion, ctx, |ai, ctx| ai.warmup_question(ctx))
            .await?;
        Ok(output.warmup_question)
    }

    pub async fn round_start_info(
        &self,
        ctx: RoundStartContext,
    ) -> Result<RoundStartInfo, CallbackError> {
        self.run(CallbackKind::RoundStartInfo, ctx, |ai, ctx| ai.round_start_info(ctx))
            .await
    }

    pub async fn answers(&self, ctx: AnswersContext) -> Result<Vec<Answer>, CallbackError> {
        let output = self
            .run(CallbackKind::Answers, ctx, |ai, ctx| ai.answers(ctx))
            .await?;
        Ok(output.answers)
    }

    /// Scores a guess, then applies the feedback length penalty.
    pub async fn score_feedback(&self, ctx: ScoreContext) -> Result<ScoreOutput, CallbackError> {
        let output = self
            .run(CallbackKind::ScoreFeedback, ctx, |ai, ctx| ai.score_feedback(ctx))
            .await?;
        Ok(apply_feedback_penalty(output))
    }

    async fn run<D, O, F>(
        &self,
        kind: CallbackKind,
        ctx: CallbackContext<D>,
        call: F,
    ) -> Result<O, CallbackError>
    where
        D: Send + 'static,
        O: CallbackOutput + Send + 'static,
        F: FnOnce(&dyn RefereeAi, &CallbackContext<D>) -> anyhow::Result<O> + Send + 'static,
    {
        let seconds = ctx.service.deadline_seconds;
        let ai = Arc::clone(&self.ai);
        debug!(callback = %kind, deadline_seconds = seconds, "Invoking callback");

        let handle = tokio::task::spawn_blocking(move || call(ai.as_ref(), &ctx));
        let output = match tokio::time::timeout(Duration::from_secs(seconds), handle).await {
            Err(_) => {
                warn!(callback = %kind, seconds, "Callback deadline expired");
                return Err(CallbackError::Timeout {
                    callback: kind,
                    seconds,
                });
            }
            Ok(Err(join_error)) if join_error.is_panic() => {
                warn!(callback = %kind, "Callback panicked");
                return Err(CallbackError::Panicked { callback: kind });
            }
            Ok(Err(join_error)) => {
                return Err(CallbackError::Failed {
                    callback: kind,
                    message: join_error.to_string(),
                });
            }
            Ok(Ok(Err(e))) => {
                warn!(callback = %kind, error = %e, "Callback returned an error");
                return Err(CallbackError::Failed {
                    callback: kind,
                    message: format!("{e:#}"),
                });
            }
            Ok(Ok(Ok(output))) => output,
        };

        let violations = output.violations();
        if !violations.is_empty() {
            warn!(callback = %kind, ?violations, "Callback output failed validation");
            return Err(CallbackError::schema(kind, violations));
        }
        Ok(output)
    }
}

impl std::fmt::Debug for CallbackExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackExecutor")
            .field("deadlines", &self.deadlines)
            .finish_non_exhaustive()
    }
}

/// Deducts [`FEEDBACK_PENALTY`] of the private score for each feedback
/// text whose word count falls outside [`FEEDBACK_WORDS`]. Never below 0.
pub fn apply_feedback_penalty(mut output: ScoreOutput) -> ScoreOutput {
    let Some(feedback) = &output.feedback else {
        return output;
    };
    let out_of_range = feedback_texts(feedback)
        .iter()
        .filter(|text| !FEEDBACK_WORDS.contains(&word_count(text)))
        .count();
    if out_of_range > 0 {
        let penalty = output.private_score * FEEDBACK_PENALTY * out_of_range as f64;
        let adjusted = (output.private_score - penalty).max(0.0);
        debug!(
            original = output.private_score,
            adjusted, out_of_range, "Feedback length penalty applied"
        );
        output.private_score = adjusted;
    }
    output
}

fn feedback_texts(feedback: &Feedback) -> [&str; 2] {
    [&feedback.opening_sentence, &feedback.associative_word]
}
