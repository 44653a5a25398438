//! Wire protocol
//!
//! Decodes inbound frames into `Command`s and encodes replies.
//! It is completely independent from other modules (loose coupling).

mod command;
mod types;
mod resp;

pub use command::Command;
pub use types::{ParseError, RespValue};
pub use resp::{RespEncoder, StreamingParser, MAX_DEPTH};
