//! Value types for the key-value store

use std::fmt;

/// Logical type of a stored object
///
/// Only `String` is produced today; the other kinds are reserved for the
/// collection types and never constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    String,
    List,
    Set,
    SortedSet,
    Hash,
}

/// Physical representation of a string object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Arbitrary UTF-8 text
    Raw,
    /// Signed 64-bit integer
    Int,
}

/// A stored value
///
/// The variant is the encoding: there is no separate tag that could
/// disagree with the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Integer value (counters and numeric strings)
    Integer(i64),

    /// Text value
    Text(String),
}

impl Value {
    /// Create an integer value
    pub fn integer(i: i64) -> Self {
        Value::Integer(i)
    }

    /// Create a text value
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Pick the compact encoding for client-supplied text
    ///
    /// Only canonical decimal forms become integers, so rendering the value
    /// back always reproduces the input ("007" or "+7" stay text).
    pub fn from_client_text(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(i) if i.to_string() == s => Value::Integer(i),
            _ => Value::Text(s.to_string()),
        }
    }

    /// Encoding of this value
    pub fn encoding(&self) -> Encoding {
        match self {
            Value::Integer(_) => Encoding::Int,
            Value::Text(_) => Encoding::Raw,
        }
    }

    /// Logical type of this value
    pub fn object_type(&self) -> ObjectType {
        ObjectType::String
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(_) => None,
        }
    }

    /// Try to get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Integer(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Text(s) => f.write_str(s),
        }
    }
}
