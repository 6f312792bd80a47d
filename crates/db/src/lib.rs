//! SQLite persistence for seasons, round assignments, match results and
//! the broadcast idempotency ledger.
//!
//! Live game state is never stored here; only records that must survive a
//! restart.

mod error;
pub mod models;
mod pool;
pub mod repositories;

pub use error::*;
pub use pool::*;
pub use repositories::*;
