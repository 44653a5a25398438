//! Connection handling
//!
//! Manages individual client connections, parsing frames and sending
//! replies.

use crate::aof::AofError;
use crate::dispatch::Dispatcher;
use crate::protocol::{Command, ParseError, RespEncoder, RespValue, StreamingParser};
use bytes::{Bytes, BytesMut};
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Why a connection stopped
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("connection reset by peer with {0} unprocessed bytes")]
    Reset(usize),

    /// The log could not be written; the whole server must stop
    #[error(transparent)]
    Aof(#[from] AofError),
}

/// Frames cut from the read buffer in one pass
struct Batch {
    commands: Vec<(Command, Bytes)>,
    error: Option<ParseError>,
}

/// Connection handler
pub struct Connection<S> {
    stream: S,

    /// Read buffer
    read_buffer: BytesMut,

    /// Write buffer
    write_buffer: BytesMut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a new connection handler
    pub fn new(stream: S) -> Self {
        Connection {
            stream,
            read_buffer: BytesMut::with_capacity(4096),
            write_buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Handle the connection
    ///
    /// Reads frames from the client, dispatches them, and sends replies.
    /// Each command holds the dispatcher lock from execution until its
    /// frame is durable.
    pub async fn handle(&mut self, dispatcher: Arc<Mutex<Dispatcher>>) -> Result<(), ConnectionError> {
        loop {
            // Read data from the stream
            let n = self.stream.read_buf(&mut self.read_buffer).await?;

            // Connection closed
            if n == 0 {
                if self.read_buffer.is_empty() {
                    return Ok(());
                } else {
                    return Err(ConnectionError::Reset(self.read_buffer.len()));
                }
            }

            debug!("Read {} bytes", n);

            let batch = self.take_frames();

            for (command, frame) in batch.commands {
                debug!("Parsed command: {}", command);

                let response = {
                    let mut disp = dispatcher.lock().await;
                    disp.handle(&command, &frame)?
                };

                debug!("Response: {}", response);
                self.send_response(&response).await?;
            }

            if let Some(e) = batch.error {
                warn!("Protocol error: {}", e);
                let error_response = RespValue::error(format!("ERR protocol error: {}", e));
                self.send_response(&error_response).await?;
            }
        }
    }

    /// Cut every complete frame off the front of the read buffer
    ///
    /// An incomplete trailing frame stays buffered. After a protocol error
    /// everything still buffered is discarded.
    fn take_frames(&mut self) -> Batch {
        let mut spans = Vec::new();
        let mut error = None;

        let consumed = {
            let mut parser = StreamingParser::new(&self.read_buffer).strict();
            loop {
                match parser.parse_command() {
                    Ok(Some(command)) => {
                        let end = parser.position();
                        let start = end - parser.last_frame().len();
                        spans.push((command, start, end));
                    }
                    Ok(None) => break,
                    Err(e) if e.is_incomplete() => {
                        debug!("Need more data to complete command");
                        break;
                    }
                    Err(e) => {
                        error = Some(e);
                        break;
                    }
                }
            }
            parser.position()
        };

        let frames = self.read_buffer.split_to(consumed).freeze();
        if error.is_some() {
            self.read_buffer.clear();
        }

        let commands = spans
            .into_iter()
            .map(|(command, start, end)| (command, frames.slice(start..end)))
            .collect();

        Batch { commands, error }
    }

    /// Send a response to the client
    async fn send_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        // Encode the response
        self.write_buffer.clear();
        RespEncoder::encode_to(&mut self.write_buffer, response);

        // Write to the stream
        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aof::AofConfig;
    use tempfile::TempDir;
    use tokio_test::io::Builder;

    fn shared(dispatcher: Dispatcher) -> Arc<Mutex<Dispatcher>> {
        Arc::new(Mutex::new(dispatcher))
    }

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let stream = Builder::new()
            .read(b"*3\r\n$3\r\nSET\r\n$2\r\nk1\r\n$2\r\nv1\r\n")
            .write(b"+OK\r\n")
            .read(b"*2\r\n$3\r\nGET\r\n$2\r\nk1\r\n")
            .write(b"$2\r\nv1\r\n")
            .read(b"*2\r\n$3\r\nGET\r\n$2\r\nk2\r\n")
            .write(b"$-1\r\n")
            .build();

        let mut connection = Connection::new(stream);
        connection.handle(shared(Dispatcher::new())).await.unwrap();
    }

    #[tokio::test]
    async fn test_pipelined_commands() {
        let stream = Builder::new()
            .read(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\n1\r\n*3\r\n$6\r\nINCRBY\r\n$1\r\nk\r\n$1\r\n4\r\n")
            .write(b"+OK\r\n")
            .write(b":5\r\n")
            .build();

        let mut connection = Connection::new(stream);
        connection.handle(shared(Dispatcher::new())).await.unwrap();
    }

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        // The CRLF after the last payload arrives in a second read
        let stream = Builder::new()
            .read(b"*2\r\n$6\r\nEXISTS\r\n$1\r\nk")
            .read(b"\r\n")
            .write(b":0\r\n")
            .build();

        let mut connection = Connection::new(stream);
        connection.handle(shared(Dispatcher::new())).await.unwrap();
    }

    #[tokio::test]
    async fn test_protocol_error_discards_buffer() {
        let stream = Builder::new()
            .read(b"?bad\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n")
            .write(b"-ERR protocol error: unexpected token '?' at byte 0\r\n")
            .read(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n")
            .write(b"$-1\r\n")
            .build();

        let mut connection = Connection::new(stream);
        connection.handle(shared(Dispatcher::new())).await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_with_partial_frame() {
        let stream = Builder::new().read(b"*2\r\n$3\r\nGET\r\n").build();

        let mut connection = Connection::new(stream);
        let result = connection.handle(shared(Dispatcher::new())).await;
        assert!(matches!(result, Err(ConnectionError::Reset(_))));
    }

    #[tokio::test]
    async fn test_writes_reach_the_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conn.aof");
        let config = AofConfig {
            path: path.clone(),
            enabled: true,
        };

        let frame = b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n";
        let stream = Builder::new().read(frame).write(b"+OK\r\n").build();

        let dispatcher = shared(Dispatcher::open(&config).unwrap());
        Connection::new(stream).handle(dispatcher.clone()).await.unwrap();
        dispatcher.lock().await.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), frame);
    }
}
