//! AOF error types.

use crate::protocol::ParseError;
use std::io;
use thiserror::Error;

/// Errors that can occur during AOF operations.
#[derive(Debug, Error)]
pub enum AofError {
    #[error("AOF I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("AOF corrupted at byte {offset} after {applied} commands: {source}")]
    Corrupted {
        offset: usize,
        applied: usize,
        source: ParseError,
    },

    #[error("AOF is not initialized")]
    NotInitialized,

    #[error("AOF is already initialized")]
    AlreadyInitialized,

    #[error("AOF is closed")]
    Closed,
}
