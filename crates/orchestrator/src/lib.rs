//! Referee runtime for the Q21 league.
//!
//! The [`SeasonOrchestrator`] applies league broadcasts and owns at most
//! one [`GameEngine`]; the engine drives the per-game exchange with two
//! players and calls the pluggable [`RefereeAi`] through the
//! [`CallbackExecutor`]. [`RefereeRunner`] polls a [`Transport`] and
//! sends whatever the orchestrator produces.

pub mod callbacks;
pub mod config;
pub mod deadlines;
pub mod error;
pub mod executor;
pub mod game;
pub mod runner;
pub mod season;
pub mod state_machine;
pub mod transport;

pub use callbacks::{
    AnswersContext, AnswersOutput, BookInfo, CallbackKind, RefereeAi, RoundStartContext,
    RoundStartInfo, ScoreContext, ScoreOutput, WarmupContext, WarmupQuestion,
};
pub use config::{CallbackDeadlines, ConfigError, RefereeConfig};
pub use deadlines::{DeadlinePhase, DeadlineTracker};
pub use error::{OrchestratorError, Result};
pub use executor::{CallbackError, CallbackExecutor};
pub use game::{GameEngine, GameSetup, RefereeContext};
pub use runner::RefereeRunner;
pub use season::SeasonOrchestrator;
pub use state_machine::SeasonStateMachine;
pub use transport::{RawMessage, Transport};
