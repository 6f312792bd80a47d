//! Lifecycle events for the Q21 referee
//!
//! The orchestrator publishes season transitions, game start/finish/abort
//! and dropped messages on an in-process bus so the runner and operator
//! tooling can observe a season without touching orchestrator state.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
