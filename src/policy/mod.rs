//! Policy decoders.
//!
//! # Data Flow
//! ```text
//! raw flag strings / booleans
//!     → hmac.rs       (--hmac      → Option<HmacKey>)
//!     → stamp.rs      (--tstamp    → AllowStamp)
//!     → fill.rs       (--fill      → Filler, --allow-fills → AllowFills)
//!     → ip_version.rs (-4, -6      → IpVersion)
//!     → config::resolver (assembled into ServerConfig)
//! ```
//!
//! # Design Decisions
//! - Every decoder is a pure function: raw input in, value or `PolicyError` out
//! - Decoders never exit the process; classification happens in the resolver
//! - Registries (filler factories) are immutable statics passed by reference

pub mod fill;
pub mod hmac;
pub mod ip_version;
pub mod stamp;

pub use fill::{AllowFills, Filler, FillerFactory, FILLER_FACTORIES};
pub use hmac::HmacKey;
pub use ip_version::IpVersion;
pub use stamp::AllowStamp;

use thiserror::Error;

/// Errors produced while decoding a single policy flag.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// The HMAC key had a hex prefix but was not valid hex.
    #[error("invalid hex HMAC key {raw:?}: {reason}")]
    InvalidHexKey { raw: String, reason: String },

    /// Unknown timestamp mode.
    #[error("unknown timestamp mode {0:?} (choose from none, single, dual)")]
    UnknownStamp(String),

    /// Unknown filler token.
    #[error("unknown fill {token:?} (choose from {choices})")]
    UnknownFiller { token: String, choices: String },

    /// A parameterized filler was given an unusable argument.
    #[error("invalid fill argument for {token:?}: {reason}")]
    InvalidFillArgument { token: String, reason: String },
}
