//! CinderKV - A single-node key-value store with an append-only log
//!
//! CinderKV is designed with strong cohesion and loose coupling principles:
//! - Each module has a single, well-defined responsibility
//! - Modules communicate through clear, minimal interfaces
//! - No circular dependencies between modules
//!
//! The engine core (`protocol`, `store`, `commands`, `aof`, `dispatch`) is
//! synchronous; `shell` and `server` are the async front ends.

pub mod aof;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod server;
pub mod shell;
pub mod store;

/// Re-export commonly used types
pub use aof::{AofConfig, AofError, AofManager};
pub use commands::{CommandContext, CommandError, CommandHandler};
pub use config::Config;
pub use dispatch::Dispatcher;
pub use protocol::{Command, ParseError, RespValue, StreamingParser};
pub use store::{MemoryStore, StoreError, Value};
