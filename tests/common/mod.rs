//! Shared utilities for lifecycle integration tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nlmt_server::config::ServerConfig;
use nlmt_server::lifecycle::Shutdown;
use nlmt_server::server::{Engine, EngineError};

/// How the mock behaves, picked from the first bind address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Serve until shutdown is called.
    Graceful,
    /// Ignore shutdown and never return.
    Stubborn,
    /// Return immediately.
    Instant,
    /// Fail the serve call.
    FailServe,
}

/// Engine double that records shutdown calls.
#[derive(Debug)]
pub struct MockEngine {
    pub behavior: Behavior,
    pub shutdowns: Arc<AtomicUsize>,
    stop: Shutdown,
}

impl MockEngine {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            shutdowns: Arc::new(AtomicUsize::new(0)),
            stop: Shutdown::new(),
        }
    }

    pub fn shutdown_calls(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Engine for MockEngine {
    fn construct(config: ServerConfig) -> Result<Self, EngineError> {
        let behavior = match config.addrs.first().map(String::as_str) {
            Some("fail-construct") => {
                return Err(EngineError::UnsupportedAddress("fail-construct".into()))
            }
            Some("instant") => Behavior::Instant,
            Some("stubborn") => Behavior::Stubborn,
            Some("fail-serve") => Behavior::FailServe,
            _ => Behavior::Graceful,
        };
        Ok(Self::new(behavior))
    }

    fn listen_and_serve(&self) -> impl Future<Output = Result<(), EngineError>> + Send {
        let behavior = self.behavior;
        let mut listener = self.stop.subscribe();
        async move {
            match behavior {
                Behavior::Graceful => {
                    listener.wait().await;
                    Ok(())
                }
                Behavior::Stubborn => std::future::pending().await,
                Behavior::Instant => Ok(()),
                Behavior::FailServe => Err(EngineError::Io(std::io::Error::other("boom"))),
            }
        }
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.stop.trigger();
    }
}

/// Config whose first bind address selects the mock behavior.
#[allow(dead_code)]
pub fn config_for(addr: &str) -> ServerConfig {
    ServerConfig {
        addrs: vec![addr.to_string()],
        ..Default::default()
    }
}
