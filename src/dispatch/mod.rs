//! Command dispatcher
//!
//! Routes parsed commands to the appropriate handler and owns everything a
//! command can touch: the registry, the store and the append-only log.
//! This module provides loose coupling between the front ends (shell, TCP)
//! and command implementations.

use crate::aof::{AofConfig, AofError, AofManager};
use crate::commands::{CommandContext, CommandError, CommandRegistry};
use crate::protocol::{Command, RespValue, StreamingParser};
use tracing::{debug, error, info, warn};

/// Command dispatcher
///
/// One instance is the whole engine. Mutating commands are written to the
/// log before their reply is handed back.
pub struct Dispatcher {
    /// Command registry
    registry: CommandRegistry,

    /// Command execution context
    context: CommandContext,

    /// Present when persistence is enabled
    aof: Option<AofManager>,
}

impl Dispatcher {
    /// Create an in-memory dispatcher, nothing is persisted
    pub fn new() -> Self {
        Dispatcher {
            registry: CommandRegistry::new(),
            context: CommandContext::new(),
            aof: None,
        }
    }

    /// Create a dispatcher with specified store capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Dispatcher {
            registry: CommandRegistry::new(),
            context: CommandContext::with_capacity(capacity),
            aof: None,
        }
    }

    /// Create a dispatcher backed by the log described in `config`
    ///
    /// The log is opened and fully replayed before this returns. A
    /// corrupted log stops replay and is returned as an error rather than
    /// appended to.
    pub fn open(config: &AofConfig) -> Result<Self, AofError> {
        let mut dispatcher = Dispatcher::new();

        if !config.enabled {
            info!("AOF disabled, running in memory only");
            return Ok(dispatcher);
        }

        let mut aof = AofManager::new(&config.path);
        aof.initialize()?;

        info!("Loading AOF from {:?}", config.path);
        let replayed = aof.replay(|command| {
            let reply = dispatcher.execute(&command);
            if reply.is_error() {
                warn!("Replayed command '{}' failed: {}", command, reply);
            }
        });

        match replayed {
            Ok(count) => info!("Replayed {} commands from AOF", count),
            Err(e) => {
                error!("AOF replay halted: {}", e);
                // Handles are released before the error is surfaced
                if let Err(close_err) = aof.close() {
                    warn!("Failed to close AOF after replay error: {}", close_err);
                }
                return Err(e);
            }
        }

        dispatcher.aof = Some(aof);
        Ok(dispatcher)
    }

    /// Run a command against the store without persisting it
    ///
    /// Every failure, including unknown commands, comes back as an error
    /// reply.
    pub fn execute(&mut self, command: &Command) -> RespValue {
        let name = command.name();
        if name.is_empty() {
            return RespValue::error("ERR empty command");
        }

        debug!("Dispatching command: {}", name);

        // Look up the command
        let handler = match self.registry.get(name) {
            Some(handler) => handler,
            None => {
                warn!("Unknown command: {}", name);
                return CommandError::UnknownCommand(name.to_string()).into();
            }
        };

        match handler.execute(&mut self.context, command.args()) {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Command {} failed: {}", name, e);
                e.into()
            }
        }
    }

    /// Execute a command and log `frame` if it changed the store
    ///
    /// `frame` must be the exact wire bytes the command was parsed from.
    /// The reply is only returned once the frame is durable; an error here
    /// means durability can no longer be guaranteed.
    pub fn handle(&mut self, command: &Command, frame: &[u8]) -> Result<RespValue, AofError> {
        let reply = self.execute(command);

        if let Some(aof) = self.aof.as_mut() {
            if !reply.is_error() && aof.should_persist(command.name()) {
                aof.write(frame)?;
            }
        }

        Ok(reply)
    }

    /// Handle every frame in `input`, in order
    ///
    /// A malformed frame produces a protocol error reply and the rest of
    /// the input is discarded. A final frame missing its trailing CRLF is
    /// accepted and logged in its canonical encoding.
    pub fn handle_input(&mut self, input: &[u8]) -> Result<Vec<RespValue>, AofError> {
        let mut parser = StreamingParser::new(input);
        let mut replies = Vec::new();

        loop {
            match parser.parse_command() {
                Ok(Some(command)) => {
                    // A bulk payload may end the buffer without its CRLF;
                    // the log only ever receives terminated frames
                    let frame = parser.last_frame();
                    let reply = if frame.ends_with(b"\r\n") {
                        self.handle(&command, frame)?
                    } else {
                        self.handle(&command, &command.to_wire())?
                    };
                    replies.push(reply);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Protocol error: {}", e);
                    replies.push(RespValue::error(format!("ERR protocol error: {}", e)));
                    break;
                }
            }
        }

        Ok(replies)
    }

    /// Flush and release the log, if any
    pub fn close(&mut self) -> Result<(), AofError> {
        match self.aof.as_mut() {
            Some(aof) => aof.close(),
            None => Ok(()),
        }
    }

    /// True when mutating commands are being logged
    pub fn is_persistent(&self) -> bool {
        self.aof.as_ref().is_some_and(AofManager::is_initialized)
    }

    /// Registered commands (used by the shell's help)
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Get reference to the context (for testing/inspection)
    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Get mutable reference to the context (for testing/inspection)
    pub fn context_mut(&mut self) -> &mut CommandContext {
        &mut self.context
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
