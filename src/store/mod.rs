//! In-memory storage module
//!
//! Provides the key space, the expiry table and the tagged value model.
//! This module is independent of protocol and command handling (loose coupling).

mod error;
mod memory;
mod object;
mod value;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use object::{Object, Recency, RECENCY_MAX};
pub use value::{Encoding, ObjectType, Value};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in whole seconds since the UNIX epoch
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
