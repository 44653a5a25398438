//! Append-Only File (AOF) persistence module
//!
//! Provides durability by logging mutating commands to disk.
//! The log is the concatenation of the exact wire bytes of each persisted
//! command, so replay goes through the same parser as live input.

mod error;
mod manager;
mod reader;
mod writer;

pub use error::AofError;
pub use manager::AofManager;
pub use reader::AofReader;
pub use writer::AofWriter;

use std::path::PathBuf;

/// Commands whose frames are written to the log
pub const PERSISTED_COMMANDS: &[&str] = &[
    "SET", "DEL", "EXPIRE", "EXPIREAT", "PERSIST", "INCRBY", "DECRBY",
];

/// True when `command_name` mutates the store and must be logged
///
/// Case-insensitive. Anything outside `PERSISTED_COMMANDS` is not logged.
pub fn should_persist(command_name: &str) -> bool {
    PERSISTED_COMMANDS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(command_name))
}

/// AOF configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AofConfig {
    /// Path to the AOF file
    pub path: PathBuf,
    /// Whether to enable AOF
    pub enabled: bool,
}

impl Default for AofConfig {
    fn default() -> Self {
        AofConfig {
            path: PathBuf::from("cinderkv.aof"),
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_persist() {
        for name in ["SET", "del", "Expire", "EXPIREAT", "persist", "INCRBY", "decrby"] {
            assert!(should_persist(name), "{} should be persisted", name);
        }
        for name in ["GET", "EXISTS", "TTL", "BGSAVE", "PING", ""] {
            assert!(!should_persist(name), "{} should not be persisted", name);
        }
    }
}
