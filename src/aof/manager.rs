//! AOF lifecycle
//!
//! `Uninitialized -> Initialized -> Closed`. Writes and replay are only
//! valid while initialized.

use super::{should_persist, AofError, AofReader, AofWriter};
use crate::protocol::Command;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

enum State {
    Uninitialized,
    Initialized {
        writer: AofWriter,
        /// Taken by the first replay
        reader: Option<File>,
    },
    Closed,
}

/// Owner of the log's write and read handles
pub struct AofManager {
    path: PathBuf,
    state: State,
}

impl AofManager {
    /// Create a manager for `path` without touching the filesystem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AofManager {
            path: path.into(),
            state: State::Uninitialized,
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True between `initialize` and `close`
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Initialized { .. })
    }

    /// Open the read handle (if the file exists) and the append handle
    ///
    /// A missing file means a fresh database. Any other I/O failure is
    /// returned and the manager stays uninitialized.
    pub fn initialize(&mut self) -> Result<(), AofError> {
        match self.state {
            State::Uninitialized => {}
            State::Initialized { .. } => return Err(AofError::AlreadyInitialized),
            State::Closed => return Err(AofError::Closed),
        }

        let reader = match File::open(&self.path) {
            Ok(file) => Some(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No AOF at {:?}, starting with an empty database", self.path);
                None
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let writer = AofWriter::open(&self.path)?;
        info!("AOF opened at {:?}", self.path);

        self.state = State::Initialized { writer, reader };
        Ok(())
    }

    /// True when `command_name` belongs in the log
    pub fn should_persist(&self, command_name: &str) -> bool {
        should_persist(command_name)
    }

    /// Append the raw frame bytes and sync before returning
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), AofError> {
        match &mut self.state {
            State::Initialized { writer, .. } => Ok(writer.append(bytes)?),
            State::Uninitialized => Err(AofError::NotInitialized),
            State::Closed => Err(AofError::Closed),
        }
    }

    /// Feed every logged command to `apply`, in order
    ///
    /// Reads the file once; later calls apply nothing. A malformed frame
    /// halts replay with `AofError::Corrupted`.
    pub fn replay<F>(&mut self, apply: F) -> Result<usize, AofError>
    where
        F: FnMut(Command),
    {
        let reader = match &mut self.state {
            State::Initialized { reader, .. } => reader.take(),
            State::Uninitialized => return Err(AofError::NotInitialized),
            State::Closed => return Err(AofError::Closed),
        };

        let Some(mut file) = reader else {
            return Ok(0);
        };

        let log = AofReader::from_file(&mut file)?;
        info!("Replaying AOF ({} bytes)", log.size());
        log.replay(apply)
    }

    /// Release both handles
    ///
    /// The writer is synced first; the reader is dropped either way.
    /// Closing twice, or closing a manager that was never initialized, is a
    /// no-op.
    pub fn close(&mut self) -> Result<(), AofError> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Initialized { writer, reader } => {
                let synced = writer.sync();
                drop(reader);
                drop(writer);
                info!("AOF closed");
                Ok(synced?)
            }
            State::Uninitialized | State::Closed => Ok(()),
        }
    }
}
