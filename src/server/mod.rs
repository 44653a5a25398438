//! Server module
//!
//! Handles TCP connections. This module is responsible for accepting
//! connections and delegating command processing to the dispatcher.

mod connection;

use crate::aof::AofError;
use crate::dispatch::Dispatcher;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

pub use connection::{Connection, ConnectionError};

/// Run the server
///
/// Binds `addr` and serves until the log can no longer be written.
pub async fn run(addr: &str, dispatcher: Arc<Mutex<Dispatcher>>) -> Result<()> {
    // Bind the TCP listener
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("CinderKV server listening on {}", listener.local_addr()?);

    serve(listener, dispatcher).await
}

/// Accept connections on an already bound listener
///
/// Every connection shares the same dispatcher; its mutex is the single
/// writer lock. An AOF failure on any connection stops the accept loop and
/// is returned.
pub async fn serve(listener: TcpListener, dispatcher: Arc<Mutex<Dispatcher>>) -> Result<()> {
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<AofError>(1);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, addr) = accepted.context("failed to accept connection")?;
                info!("New connection from {}", addr);

                let dispatcher = dispatcher.clone();
                let fatal_tx = fatal_tx.clone();

                // Spawn a new task to handle this connection
                tokio::spawn(async move {
                    let mut connection = Connection::new(socket);

                    match connection.handle(dispatcher).await {
                        Ok(()) => {}
                        Err(ConnectionError::Aof(e)) => {
                            error!("AOF failure on connection {}: {}", addr, e);
                            let _ = fatal_tx.send(e).await;
                        }
                        Err(e) => error!("Connection error from {}: {}", addr, e),
                    }

                    info!("Connection closed: {}", addr);
                });
            }
            Some(e) = fatal_rx.recv() => {
                return Err(anyhow::Error::new(e).context("durability lost, stopping server"));
            }
        }
    }
}
