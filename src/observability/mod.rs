//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! tracing macros (all subsystems)
//!     → logging.rs (EnvFilter, -Q cap, fmt layer)
//!     → stderr (errors) / stdout (the rest)
//!
//! server events
//!     → events::ConsoleSink → tracing
//! ```
//!
//! # Design Decisions
//! - RUST_LOG picks the directives; `-Q` still caps them at error

pub mod logging;
