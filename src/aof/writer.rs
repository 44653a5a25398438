//! AOF writer
//!
//! Appends raw frames to the log and syncs them before returning.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Append-only handle on the log file
pub struct AofWriter {
    file: File,
}

impl AofWriter {
    /// Open the log for appending, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        Ok(AofWriter { file })
    }

    /// Append bytes and force them to stable storage
    ///
    /// When this returns `Ok` the bytes survive a crash.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.sync_data()
    }

    /// Force sync to disk
    pub fn sync(&self) -> io::Result<()> {
        self.file.sync_all()
    }
}
