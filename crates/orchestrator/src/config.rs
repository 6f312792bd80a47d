use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required config field: {0}")]
    MissingField(&'static str),

    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Per-callback deadline overrides in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallbackDeadlines {
    pub warmup_question: Option<u64>,
    pub round_start_info: Option<u64>,
    pub answers: Option<u64>,
    pub score_feedback: Option<u64>,
}

/// Identity and wiring for one referee instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefereeConfig {
    pub referee_id: String,
    pub referee_email: String,
    pub group_id: String,
    pub display_name: String,
    pub league_id: String,
    pub season_id: String,
    pub league_manager_email: String,
    pub poll_interval_seconds: u64,
    pub database_url: String,
    pub mailbox_dir: String,
    pub assignment_table_id: Option<String>,
    /// Referee-private answer key passed to the scoring callback.
    pub actual_opening_sentence: Option<String>,
    pub actual_associative_word: Option<String>,
    pub callback_deadlines: CallbackDeadlines,
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            referee_id: String::new(),
            referee_email: String::new(),
            group_id: String::new(),
            display_name: "Q21 Referee".to_string(),
            league_id: String::new(),
            season_id: String::new(),
            league_manager_email: String::new(),
            poll_interval_seconds: 5,
            database_url: "sqlite:q21_referee.db".to_string(),
            mailbox_dir: "mailbox".to_string(),
            assignment_table_id: None,
            actual_opening_sentence: None,
            actual_associative_word: None,
            callback_deadlines: CallbackDeadlines::default(),
        }
    }
}

impl RefereeConfig {
    pub fn new(referee_id: impl Into<String>, referee_email: impl Into<String>) -> Self {
        Self {
            referee_id: referee_id.into(),
            referee_email: referee_email.into(),
            ..Default::default()
        }
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    pub fn with_league(mut self, league_id: impl Into<String>, season_id: impl Into<String>) -> Self {
        self.league_id = league_id.into();
        self.season_id = season_id.into();
        self
    }

    pub fn with_league_manager(mut self, email: impl Into<String>) -> Self {
        self.league_manager_email = email.into();
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn with_callback_deadlines(mut self, deadlines: CallbackDeadlines) -> Self {
        self.callback_deadlines = deadlines;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.referee_id.trim().is_empty() {
            return Err(ConfigError::MissingField("referee_id"));
        }
        if self.league_manager_email.trim().is_empty() {
            return Err(ConfigError::MissingField("league_manager_email"));
        }
        if self.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_seconds",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
