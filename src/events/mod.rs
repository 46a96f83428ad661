//! Event reporting subsystem.
//!
//! # Data Flow
//! ```text
//! engine emits Event
//!     → MultiHandler (ordered fan-out)
//!         → console.rs  (always, via tracing)
//!         → syslog.rs   (optional, --syslog)
//!         → netprint.rs (optional, -n)
//! ```
//!
//! # Design Decisions
//! - Sinks share one capability trait, composed as an ordered list
//! - A failing sink is logged and skipped; the others still receive the event
//! - Network sinks queue events for their own writer thread, so a stalled
//!   collector never delays the sinks after it or the engine's tasks

pub mod composer;
pub mod console;
pub mod netprint;
pub mod outbox;
#[cfg(unix)]
pub mod syslog;

pub use composer::{compose, ComposeError, SinkOptions};
pub use console::ConsoleSink;
pub use netprint::NetPrint;
#[cfg(unix)]
pub use syslog::SyslogSink;

use std::fmt;
use std::net::SocketAddr;

use serde::Serialize;
use thiserror::Error;

/// Whether this build can log to syslog.
pub const SYSLOG_SUPPORT: bool = cfg!(unix);

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCode {
    ServerStart,
    ServerStop,
    ListenerStart,
    ListenerStop,
    ListenerError,
    /// A datagram was dropped.
    Drop,
}

impl EventCode {
    /// Events that occur once per packet and are hidden by `-q`.
    pub fn is_per_packet(&self) -> bool {
        matches!(self, Self::Drop)
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::ListenerError => Severity::Error,
            Self::Drop => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

/// Syslog-compatible severities, lowest value is most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error = 3,
    Warning = 4,
    Info = 6,
}

/// A single server event.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub code: EventCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<SocketAddr>,
    pub message: String,
}

impl Event {
    pub fn new(code: EventCode, message: impl Into<String>) -> Self {
        Self {
            code,
            local: None,
            remote: None,
            message: message.into(),
        }
    }

    pub fn with_local(mut self, addr: SocketAddr) -> Self {
        self.local = Some(addr);
        self
    }

    pub fn with_remote(mut self, addr: SocketAddr) -> Self {
        self.remote = Some(addr);
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(remote) = self.remote {
            write!(f, "[{}] ", remote)?;
        }
        if let Some(local) = self.local {
            write!(f, "[{}] ", local)?;
        }
        f.write_str(&self.message)
    }
}

/// Errors constructing or delivering to a sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The syslog URI could not be understood.
    #[error("invalid syslog URI {uri:?}: {reason}")]
    SyslogUri { uri: String, reason: String },

    /// Connecting to a remote collector failed.
    #[error("unable to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing an event failed.
    #[error("delivery failed: {0}")]
    Delivery(#[from] std::io::Error),

    /// Event could not be encoded.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// The syslog daemon could not be reached or written to.
    #[error("syslog {target}: {reason}")]
    Syslog { target: String, reason: String },

    /// The sink's queue is full; the event was dropped for that sink only.
    #[error("{sink} queue full")]
    Backlogged { sink: &'static str },

    /// The sink was already closed.
    #[error("sink closed")]
    Closed,
}

/// Capability to receive events.
pub trait Handler: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Deliver one event.
    fn on_event(&self, event: &Event) -> Result<(), SinkError>;
}

impl<H: Handler + ?Sized> Handler for std::sync::Arc<H> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn on_event(&self, event: &Event) -> Result<(), SinkError> {
        (**self).on_event(event)
    }
}

/// Dispatches every event to each registered sink in order.
#[derive(Debug, Default)]
pub struct MultiHandler {
    handlers: Vec<Box<dyn Handler>>,
}

impl MultiHandler {
    pub fn new(handlers: Vec<Box<dyn Handler>>) -> Self {
        Self { handlers }
    }

    /// Append a sink after the existing ones.
    pub fn add_handler(&mut self, handler: Box<dyn Handler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Sink names in delivery order.
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Deliver to every sink. Returns how many sinks failed.
    pub fn emit(&self, event: &Event) -> usize {
        let mut failures = 0;
        for handler in &self.handlers {
            if let Err(e) = handler.on_event(event) {
                failures += 1;
                tracing::warn!(
                    sink = handler.name(),
                    code = ?event.code,
                    error = %e,
                    "Event delivery failed"
                );
            }
        }
        failures
    }
}

impl Handler for MultiHandler {
    fn name(&self) -> &'static str {
        "multi"
    }

    fn on_event(&self, event: &Event) -> Result<(), SinkError> {
        self.emit(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Handler for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn on_event(&self, _event: &Event) -> Result<(), SinkError> {
            self.log.lock().unwrap().push(self.name);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Broken {
        calls: Arc<AtomicUsize>,
    }

    impl Handler for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn on_event(&self, _event: &Event) -> Result<(), SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SinkError::Closed)
        }
    }

    #[test]
    fn test_fan_out_preserves_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut multi = MultiHandler::default();
        for name in ["first", "second", "third"] {
            multi.add_handler(Box::new(Recording { name, log: log.clone() }));
        }

        let failures = multi.emit(&Event::new(EventCode::ServerStart, "up"));
        assert_eq!(failures, 0);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
        assert_eq!(multi.names(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let multi = MultiHandler::new(vec![
            Box::new(Recording { name: "before", log: log.clone() }),
            Box::new(Broken { calls: calls.clone() }),
            Box::new(Recording { name: "after", log: log.clone() }),
        ]);

        let event = Event::new(EventCode::ListenerStop, "down");
        assert_eq!(multi.emit(&event), 1);
        assert!(multi.on_event(&event).is_ok());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*log.lock().unwrap(), vec!["before", "after", "before", "after"]);
    }

    #[test]
    fn test_event_display() {
        let event = Event::new(EventCode::Drop, "too long")
            .with_local("127.0.0.1:2112".parse().unwrap())
            .with_remote("10.0.0.1:5000".parse().unwrap());
        assert_eq!(event.to_string(), "[10.0.0.1:5000] [127.0.0.1:2112] too long");
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::new(EventCode::ListenerStart, "listening");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["code"], "listener_start");
        assert_eq!(json["message"], "listening");
        assert!(json.get("local").is_none());
    }

    #[test]
    fn test_severity() {
        assert_eq!(EventCode::ListenerError.severity(), Severity::Error);
        assert_eq!(EventCode::ServerStart.severity(), Severity::Info);
        assert!(EventCode::Drop.is_per_packet());
        assert!(!EventCode::ServerStop.is_per_packet());
    }
}
