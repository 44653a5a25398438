//! Command execution module
//!
//! Provides a unified interface for all commands through the CommandHandler trait.
//! Each command family is implemented in a separate file for high cohesion.

mod context;
mod registry;

// Command implementations
mod string;
mod key;
mod ttl;
mod counter;
mod admin;

pub use context::CommandContext;
pub use registry::CommandRegistry;

use crate::protocol::RespValue;
use crate::store::StoreError;
use thiserror::Error;

/// Command execution trait
///
/// All commands implement this trait with a single execute method.
/// This provides loose coupling between command implementations and the dispatcher.
pub trait CommandHandler: Send + Sync {
    /// Execute the command with the given context and arguments
    ///
    /// Arguments:
    /// - ctx: mutable reference to the command context (contains the store)
    /// - args: command arguments (excluding the command name itself)
    ///
    /// Returns the reply to send, or an error the caller renders as an
    /// error reply.
    fn execute(&self, ctx: &mut CommandContext, args: &[String]) -> Result<RespValue, CommandError>;

    /// Upper-case command name
    fn name(&self) -> &'static str;

    /// Usage line, e.g. `SET key value`
    fn syntax(&self) -> &'static str;

    /// One-line description
    fn summary(&self) -> &'static str;
}

/// Errors a command reports back to the client
///
/// None of these stop the engine; each one becomes a `-ERR` reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    #[error("ERR value is not an integer or out of range")]
    InvalidInteger,

    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpireTime(String),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    #[error("ERR {0}")]
    Store(#[from] StoreError),
}

impl From<CommandError> for RespValue {
    fn from(err: CommandError) -> Self {
        RespValue::error(err.to_string())
    }
}

/// Check the argument count and hand back a fixed-size view
pub(crate) fn expect_args<'a, const N: usize>(
    name: &str,
    args: &'a [String],
) -> Result<&'a [String; N], CommandError> {
    <&[String; N]>::try_from(args).map_err(|_| CommandError::WrongArity(name.to_lowercase()))
}

/// Parse a base-10 integer argument
pub(crate) fn parse_integer(arg: &str) -> Result<i64, CommandError> {
    arg.parse::<i64>().map_err(|_| CommandError::InvalidInteger)
}

#[cfg(test)]
pub(crate) fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
