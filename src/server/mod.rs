//! Measurement engine seam.
//!
//! # Data Flow
//! ```text
//! ServerConfig
//!     → Engine::construct
//!     → Engine::listen_and_serve (blocks until stopped)
//!         ← Engine::shutdown (from the signal task)
//! ```
//!
//! # Design Decisions
//! - The lifecycle layer only sees this trait
//! - `shutdown` is synchronous and must be safe while serving
//! - `reflector.rs` is the stock engine: bind, echo, emit events

pub mod bind;
pub mod reflector;

pub use bind::BindSpec;
pub use reflector::Reflector;

use std::future::Future;

use thiserror::Error;

use crate::config::ServerConfig;

/// Errors raised by an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid bind address {addr:?}: {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("interface bind addresses are not supported: {0:?}")]
    UnsupportedAddress(String),

    #[error("unable to resolve {addr:?}: {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable {ip_version} address for {addr:?}")]
    NoAddress { addr: String, ip_version: String },

    #[error("unable to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("listener failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A server that can be built from config, run, and asked to stop.
pub trait Engine: Send + Sync + 'static {
    /// Build the engine. The config is moved in and never changes afterwards.
    fn construct(config: ServerConfig) -> Result<Self, EngineError>
    where
        Self: Sized;

    /// Serve until stopped or failed.
    fn listen_and_serve(&self) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Ask a running `listen_and_serve` to return.
    fn shutdown(&self);
}
