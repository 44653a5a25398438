//! Wire value and error types
//!
//! `RespValue` is the reply side of the protocol; `ParseError` covers every
//! way an inbound frame can be malformed.

use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Protocol values produced by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple strings: +OK\r\n
    SimpleString(String),

    /// Errors: -ERR message\r\n
    Error(String),

    /// Integers: :1000\r\n
    Integer(i64),

    /// Bulk strings: $6\r\nfoobar\r\n
    BulkString(Bytes),

    /// Null bulk string: $-1\r\n
    Null,

    /// Arrays: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Create a simple string
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// The `+OK` status reply
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// Create an error
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Create an integer
    pub fn integer(i: i64) -> Self {
        RespValue::Integer(i)
    }

    /// Create a bulk string from bytes
    pub fn bulk_string(b: impl Into<Bytes>) -> Self {
        RespValue::BulkString(b.into())
    }

    /// Create a null value
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Create an array
    pub fn array(v: Vec<RespValue>) -> Self {
        RespValue::Array(v)
    }

    /// Check if this is an error reply
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Try to extract integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RespValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "SimpleString({})", s),
            RespValue::Error(e) => write!(f, "Error({})", e),
            RespValue::Integer(i) => write!(f, "Integer({})", i),
            RespValue::BulkString(b) => write!(f, "BulkString({} bytes)", b.len()),
            RespValue::Null => write!(f, "Null"),
            RespValue::Array(arr) => write!(f, "Array({} elements)", arr.len()),
        }
    }
}

/// Frame decoding errors
///
/// Offsets are byte positions within the buffer handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The buffer ended in the middle of a frame
    #[error("unexpected end of input at byte {offset}")]
    Truncated { offset: usize },

    /// A `\r` not followed by `\n`, or a payload not followed by CRLF
    #[error("expected CRLF at byte {offset}")]
    MissingCrlf { offset: usize },

    /// Leading byte that introduces no known frame type
    #[error("unexpected token {token:?} at byte {offset}")]
    UnexpectedToken { token: char, offset: usize },

    #[error("invalid integer payload {0:?}")]
    InvalidInteger(String),

    #[error("invalid length {0:?}")]
    InvalidLength(String),

    #[error("invalid boolean payload {0:?}, expected 't' or 'f'")]
    InvalidBoolean(String),

    #[error("invalid UTF-8 in frame at byte {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("aggregates nested deeper than {0} levels")]
    TooDeep(usize),
}

impl ParseError {
    /// True when appending more bytes could turn this failure into a
    /// successful parse.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, ParseError::Truncated { .. })
    }
}
