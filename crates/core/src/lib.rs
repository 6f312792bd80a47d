//! Domain types shared by the Q21 referee crates.

pub mod domain;
mod error;
mod game_id;

pub use domain::*;
pub use error::*;
pub use game_id::*;
