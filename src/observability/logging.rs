//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Map `-Q` onto an error-only cap that RUST_LOG cannot lift
//! - Send errors to stderr and everything else to stdout

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives when RUST_LOG is unset.
pub fn default_directives(really_quiet: bool) -> &'static str {
    if really_quiet {
        "nlmt_server=error"
    } else {
        "nlmt_server=info"
    }
}

/// Ceiling applied on top of RUST_LOG.
pub fn level_cap(really_quiet: bool) -> Option<LevelFilter> {
    really_quiet.then_some(LevelFilter::ERROR)
}

/// Install the global subscriber.
pub fn init(really_quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(really_quiet).into());

    let writer = std::io::stderr
        .with_max_level(Level::ERROR)
        .or_else(std::io::stdout);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(level_cap(really_quiet))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(writer),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "nlmt_server=info");
        assert_eq!(default_directives(true), "nlmt_server=error");
    }

    #[test]
    fn test_really_quiet_caps_at_error() {
        assert_eq!(level_cap(true), Some(LevelFilter::ERROR));
        assert_eq!(level_cap(false), None);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
