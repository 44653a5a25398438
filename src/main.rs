use anyhow::{Context, Result};
use cinderkv::{server, shell, Config, Dispatcher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    // RUST_LOG wins over the configured level; logs go to stderr so the
    // shell keeps stdout to itself
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("CinderKV starting...");

    // Replay finishes before any input is accepted
    let mut dispatcher = Dispatcher::open(&config.aof_config())
        .with_context(|| format!("failed to open AOF at {:?}", config.aof_path))?;

    let (outcome, closed) = match config.listen.as_deref() {
        Some(addr) => {
            let dispatcher = Arc::new(Mutex::new(dispatcher));

            let outcome = tokio::select! {
                result = server::run(addr, dispatcher.clone()) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, shutting down");
                    Ok(())
                }
            };

            let closed = dispatcher.lock().await.close();
            (outcome, closed)
        }
        None => {
            let outcome = shell::run_stdio(&mut dispatcher).await;
            let closed = dispatcher.close();
            (outcome, closed)
        }
    };

    if let Err(e) = &outcome {
        error!("Stopped on error: {:#}", e);
    }
    closed.context("failed to close AOF")?;
    outcome
}
