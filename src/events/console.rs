//! Console sink.

use super::{Event, Handler, Severity, SinkError};

/// Writes events through the process logger.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    quiet: bool,
}

impl ConsoleSink {
    /// `quiet` hides per-packet events.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Handler for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    fn on_event(&self, event: &Event) -> Result<(), SinkError> {
        if self.quiet && event.code.is_per_packet() {
            return Ok(());
        }

        match event.code.severity() {
            Severity::Error => tracing::error!(code = ?event.code, "{}", event),
            Severity::Warning => tracing::warn!(code = ?event.code, "{}", event),
            Severity::Info => tracing::info!(code = ?event.code, "{}", event),
        }
        Ok(())
    }
}
