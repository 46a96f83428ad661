//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! argv
//!     → cli.rs (clap, typed but unvalidated)
//!     → policy/* (decoders)
//!     → resolver.rs (decoded policies + scalars + sinks)
//!     → ServerConfig (validated, immutable)
//!     → moved into the engine
//! ```
//!
//! # Design Decisions
//! - Config is built once, before any task is spawned
//! - Resolution is all-or-nothing: the first error aborts it
//! - Every error carries its exit classification

pub mod resolver;
pub mod schema;

pub use resolver::{resolve, ConfigError};
pub use schema::{OutputDestination, OutputFile, ServerConfig};
