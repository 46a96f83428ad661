//! Network latency measurement server: startup, configuration and shutdown.

/// Short program name, used as the default syslog tag.
pub const PROGRAM_NAME: &str = "nlmt";

pub mod cli;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod server;

pub use cli::Cli;
pub use config::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::{Engine, Reflector};
