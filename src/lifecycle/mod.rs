//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     ServerConfig → construct engine → spawn signal controller → serve
//!
//! Signals (signals.rs):
//!     first SIGINT/SIGTERM  → engine.shutdown() (graceful)
//!     second SIGINT/SIGTERM → process exit with the double-signal code
//!
//! Exit (exit.rs):
//!     error → ExitClass → process exit code
//! ```
//!
//! # Design Decisions
//! - Graceful shutdown has no deadline; a second signal is the escape hatch
//! - The forced exit skips cleanup, including closing the netprint connection
//! - The signal channel holds one pending signal so none is lost at startup

pub mod exit;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use exit::ExitClass;
pub use shutdown::Shutdown;
pub use signals::{LifecycleState, Signal};
pub use startup::{run, serve, LifecycleError};
