//! Startup orchestration.
//!
//! # Responsibilities
//! - Construct the engine from the resolved configuration
//! - Start the signal controller beside the blocking serve call
//! - Close the netprint connection on every normal exit path
//!
//! # Design Decisions
//! - Fail fast: any construction or serve error is a runtime error
//! - The forced exit does not come back here, so it skips the close

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use super::exit::ExitClass;
use super::signals::{self, Signal, SignalController};
use crate::config::ServerConfig;
use crate::server::{Engine, EngineError};

/// Failures after configuration was resolved.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("unable to start server: {0}")]
    Construct(#[source] EngineError),

    #[error("server failed: {0}")]
    Serve(#[source] EngineError),

    #[error("unable to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

impl LifecycleError {
    pub fn exit_class(&self) -> ExitClass {
        ExitClass::RuntimeError
    }
}

/// Construct `E` from `config`, serve until stopped, then release resources.
pub async fn run<E: Engine>(config: ServerConfig) -> Result<(), LifecycleError> {
    let netprint = config.netprint.clone();

    let result = start::<E>(config).await;

    if let Some(np) = netprint {
        // draining waits on the sink's writer thread
        if tokio::task::spawn_blocking(move || np.close()).await.is_err() {
            tracing::warn!("Netprint close task failed");
        }
    }
    result
}

async fn start<E: Engine>(config: ServerConfig) -> Result<(), LifecycleError> {
    let engine = Arc::new(E::construct(config).map_err(LifecycleError::Construct)?);
    let signals = signals::listen().map_err(LifecycleError::Signals)?;
    serve(engine, signals, exit_process).await
}

/// Serve `engine` while a controller task watches `signals`.
///
/// `exit` is called with the double-signal code on a second signal.
pub async fn serve<E, X>(
    engine: Arc<E>,
    signals: mpsc::Receiver<Signal>,
    exit: X,
) -> Result<(), LifecycleError>
where
    E: Engine,
    X: FnOnce(i32) + Send + 'static,
{
    let controller = SignalController::new(signals);
    let handle = engine.clone();
    let task = tokio::spawn(controller.run(move || handle.shutdown(), exit));

    let result = engine.listen_and_serve().await;
    task.abort();

    match result {
        Ok(()) => {
            tracing::info!("Server stopped");
            Ok(())
        }
        Err(e) => Err(LifecycleError::Serve(e)),
    }
}

fn exit_process(code: i32) {
    std::process::exit(code);
}
