//! AOF reader
//!
//! Loads the whole log and feeds it through the streaming parser.

use super::AofError;
use crate::protocol::{Command, StreamingParser};
use std::fs::File;
use std::io::{self, Read};
use tracing::{error, info};

/// In-memory copy of the log
pub struct AofReader {
    data: Vec<u8>,
}

impl AofReader {
    /// Read everything left in an already open handle
    pub fn from_file(file: &mut File) -> io::Result<Self> {
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Self::from_bytes(data))
    }

    /// Wrap bytes that are already in memory
    pub fn from_bytes(data: Vec<u8>) -> Self {
        AofReader { data }
    }

    /// Hand every command in the log to `apply`, in order
    ///
    /// Stops at the first malformed frame; commands before it have been
    /// applied, nothing after it is. Returns the number of commands applied.
    pub fn replay<F>(&self, mut apply: F) -> Result<usize, AofError>
    where
        F: FnMut(Command),
    {
        let mut parser = StreamingParser::new(&self.data);
        let mut applied = 0;

        loop {
            match parser.parse_command() {
                Ok(Some(command)) => {
                    apply(command);
                    applied += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    let offset = parser.position();
                    error!("Failed to parse AOF command at byte {}: {}", offset, e);
                    return Err(AofError::Corrupted {
                        offset,
                        applied,
                        source: e,
                    });
                }
            }
        }

        info!("AOF loaded successfully: {} commands", applied);
        Ok(applied)
    }

    /// Get the total size of the AOF data
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aof::AofWriter;
    use tempfile::TempDir;

    fn names(reader: &AofReader) -> (Result<usize, AofError>, Vec<String>) {
        let mut seen = Vec::new();
        let result = reader.replay(|cmd| seen.push(cmd.to_string()));
        (result, seen)
    }

    #[test]
    fn test_load_and_replay() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reader.aof");

        let mut writer = AofWriter::open(&path).unwrap();
        writer
            .append(&Command::from_parts(["SET", "key1", "value1"]).unwrap().to_wire())
            .unwrap();
        writer
            .append(&Command::from_parts(["DEL", "key1"]).unwrap().to_wire())
            .unwrap();

        let mut file = File::open(&path).unwrap();
        let reader = AofReader::from_file(&mut file).unwrap();
        let (result, seen) = names(&reader);

        assert_eq!(result.unwrap(), 2);
        assert_eq!(seen, vec!["SET key1 value1", "DEL key1"]);
    }

    #[test]
    fn test_empty_log() {
        let reader = AofReader::from_bytes(Vec::new());
        let (result, seen) = names(&reader);
        assert_eq!(result.unwrap(), 0);
        assert!(seen.is_empty());
        assert_eq!(reader.size(), 0);
    }

    #[test]
    fn test_stops_at_corruption() {
        let mut data = Command::from_parts(["SET", "a", "1"]).unwrap().to_wire().to_vec();
        let good_len = data.len();
        data.extend_from_slice(b"?garbage\r\n");
        data.extend_from_slice(&Command::from_parts(["SET", "b", "2"]).unwrap().to_wire());

        let reader = AofReader::from_bytes(data);
        let (result, seen) = names(&reader);

        assert_eq!(seen, vec!["SET a 1"]);
        match result {
            Err(AofError::Corrupted { offset, applied, .. }) => {
                assert_eq!(offset, good_len);
                assert_eq!(applied, 1);
            }
            other => panic!("expected corruption, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_tail() {
        let mut data = Command::from_parts(["SET", "a", "1"]).unwrap().to_wire().to_vec();
        data.extend_from_slice(b"*3\r\n$3\r\nSET\r\n$1\r\nb");

        let reader = AofReader::from_bytes(data);
        let (result, seen) = names(&reader);

        assert_eq!(seen.len(), 1);
        assert!(matches!(result, Err(AofError::Corrupted { applied: 1, .. })));
    }
}
