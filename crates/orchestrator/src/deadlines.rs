use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use protocol::{ANSWERS_DEADLINE_MINUTES, ROUND_START_DEADLINE_MINUTES, WARMUP_DEADLINE_MINUTES};

/// Response windows match the deadlines written into the outgoing envelopes.
pub const WARMUP_RESPONSE_SECONDS: u64 = WARMUP_DEADLINE_MINUTES as u64 * 60;
pub const QUESTIONS_SECONDS: u64 = ROUND_START_DEADLINE_MINUTES as u64 * 60;
pub const GUESS_SECONDS: u64 = ANSWERS_DEADLINE_MINUTES as u64 * 60;

/// What the referee is waiting on a player for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadlinePhase {
    Warmup,
    Questions,
    Guess,
}

impl DeadlinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warmup => "warmup",
            Self::Questions => "questions",
            Self::Guess => "guess",
        }
    }

    pub fn default_seconds(&self) -> u64 {
        match self {
            Self::Warmup => WARMUP_RESPONSE_SECONDS,
            Self::Questions => QUESTIONS_SECONDS,
            Self::Guess => GUESS_SECONDS,
        }
    }
}

impl std::fmt::Display for DeadlinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredDeadline {
    pub phase: DeadlinePhase,
    pub email: String,
}

impl ExpiredDeadline {
    /// Abort reason reported for this expiry.
    pub fn reason(&self) -> String {
        format!("timeout: {} deadline expired for {}", self.phase, self.email)
    }
}

#[derive(Debug, Clone)]
struct Deadline {
    phase: DeadlinePhase,
    expires_at: Instant,
}

/// Per-player response deadlines, at most one per player.
#[derive(Debug, Default)]
pub struct DeadlineTracker {
    deadlines: HashMap<String, Deadline>,
}

impl DeadlineTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any deadline already set for `email`.
    pub fn set(&mut self, phase: DeadlinePhase, email: &str, seconds: u64) {
        debug!(phase = %phase, email, seconds, "Deadline set");
        self.deadlines.insert(
            email.to_lowercase(),
            Deadline {
                phase,
                expires_at: Instant::now() + Duration::from_secs(seconds),
            },
        );
    }

    pub fn cancel(&mut self, email: &str) -> bool {
        self.deadlines.remove(&email.to_lowercase()).is_some()
    }

    /// Removes and returns every deadline that has passed.
    pub fn check_expired(&mut self) -> Vec<ExpiredDeadline> {
        let now = Instant::now();
        let mut expired: Vec<ExpiredDeadline> = self
            .deadlines
            .iter()
            .filter(|(_, d)| d.expires_at <= now)
            .map(|(email, d)| ExpiredDeadline {
                phase: d.phase,
                email: email.clone(),
            })
            .collect();
        for e in &expired {
            self.deadlines.remove(&e.email);
        }
        expired.sort_by(|a, b| a.email.cmp(&b.email));
        expired
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn phase_for(&self, email: &str) -> Option<DeadlinePhase> {
        self.deadlines.get(&email.to_lowercase()).map(|d| d.phase)
    }
}
