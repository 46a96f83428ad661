//! Network-print sink: newline-delimited JSON events over TCP.
//!
//! # Responsibilities
//! - Connect to a remote log collector at startup
//! - Forward every event as one JSON line
//! - Close the connection exactly once at process exit

use std::io::Write;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use super::outbox::{Outbox, QUEUE_DEPTH};
use super::{Event, Handler, SinkError};

/// A collector that accepts no bytes for this long is abandoned.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection to a remote log collector.
#[derive(Debug)]
pub struct NetPrint {
    addr: String,
    outbox: Outbox<Vec<u8>>,
}

impl NetPrint {
    /// Open a connection to `addr` (`host:port`).
    pub fn connect(addr: &str) -> Result<Self, SinkError> {
        let connect_err = |source| SinkError::Connect {
            addr: addr.to_string(),
            source,
        };
        let mut stream = TcpStream::connect(addr).map_err(connect_err)?;
        stream
            .set_write_timeout(Some(WRITE_TIMEOUT))
            .map_err(connect_err)?;
        // events are small and infrequent
        let _ = stream.set_nodelay(true);

        let peer = addr.to_string();
        let outbox = Outbox::spawn("netprint", QUEUE_DEPTH, move |line: Vec<u8>| {
            if let Err(e) = stream.write_all(&line) {
                let _ = stream.shutdown(Shutdown::Both);
                return Err(e.into());
            }
            Ok(())
        })?;

        tracing::info!(addr = %peer, "Connected to netprint server");
        Ok(Self {
            addr: addr.to_string(),
            outbox,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_closed(&self) -> bool {
        self.outbox.is_closed()
    }

    /// Flush queued events and close the connection.
    ///
    /// Returns false if it was already closed.
    pub fn close(&self) -> bool {
        let closed = self.outbox.close();
        if closed {
            tracing::info!(addr = %self.addr, "Netprint connection closed");
        }
        closed
    }
}

impl Handler for NetPrint {
    fn name(&self) -> &'static str {
        "netprint"
    }

    fn on_event(&self, event: &Event) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        self.outbox.push(line)
    }
}
