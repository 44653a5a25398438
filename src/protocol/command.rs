//! Parsed client command

use super::resp::RespEncoder;
use super::types::RespValue;
use bytes::Bytes;
use std::fmt;

/// A command decoded from one top-level frame
///
/// The first element of the frame becomes the name, everything after it
/// becomes the flattened argument list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    name: String,
    args: Vec<String>,
}

impl Command {
    /// Build a command from a name and its arguments
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Command {
            name: name.into(),
            args,
        }
    }

    /// Build a command from whitespace-free parts, first part is the name
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_parts<I, S>(parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = parts.into_iter().map(Into::into);
        let name = parts.next()?;
        Some(Command {
            name,
            args: parts.collect(),
        })
    }

    /// Command name exactly as received
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments following the name
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Split into name and arguments
    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.name, self.args)
    }

    /// Encode as an array of bulk strings, the conventional client form
    pub fn to_resp(&self) -> RespValue {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(RespValue::bulk_string(self.name.clone()));
        for arg in &self.args {
            parts.push(RespValue::bulk_string(arg.clone()));
        }
        RespValue::array(parts)
    }

    /// Wire bytes of `to_resp`
    pub fn to_wire(&self) -> Bytes {
        RespEncoder::encode(&self.to_resp())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
