//! Wire protocol for the Q21 league.
//!
//! Covers the uniform message envelope, the closed set of message types
//! with their per-type validators, the dispatcher that validates raw
//! messages, the `protocol::role::email::tx::type` subject codec and the
//! referee-side builders for outgoing envelopes.

mod builder;
mod dispatcher;
mod envelope;
mod error;
mod error_response;
mod incoming;
mod message_type;
mod payloads;
mod registry;
mod subject;
mod validation;

pub use builder::*;
pub use dispatcher::*;
pub use envelope::*;
pub use error::*;
pub use error_response::*;
pub use incoming::*;
pub use message_type::*;
pub use payloads::q21::{ANSWER_CHOICES, BREAKDOWN_KEYS};
pub use payloads::{validate_envelope, validate_payload};
pub use registry::*;
pub use subject::*;
pub use validation::*;
