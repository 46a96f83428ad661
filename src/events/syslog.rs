//! Syslog sink.
//!
//! # Responsibilities
//! - Parse `scheme://host:port/tag` URIs (`local`, `udp`, `tcp`)
//! - Connect once at startup; failures are fatal to startup
//! - Hand each event to the daemon at the matching severity
//!
//! # Design Decisions
//! - Facility is always `daemon`; RFC 3164 framing comes from the `syslog` crate
//! - Writes happen on the sink's own queue so a slow daemon never stalls emitters

use std::io::Write;
use std::net::{SocketAddr, ToSocketAddrs};

use syslog::{Facility, Formatter3164, Logger, LoggerBackend};
use url::Url;

use super::outbox::{Outbox, QUEUE_DEPTH};
use super::{Event, Handler, Severity, SinkError};

/// Default tag when the URI carries none.
pub const DEFAULT_TAG: &str = crate::PROGRAM_NAME;

/// Default port for `udp` and `tcp` URIs.
pub const DEFAULT_PORT: u16 = 514;

/// Where syslog lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Local,
    Udp { host: String, port: u16 },
    Tcp { host: String, port: u16 },
}

/// A parsed `--syslog` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogTarget {
    pub transport: Transport,
    pub tag: String,
}

impl SyslogTarget {
    pub fn parse(uri: &str) -> Result<Self, SinkError> {
        let invalid = |reason: &str| SinkError::SyslogUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;

        let tag = url.path().trim_start_matches('/');
        let tag = if tag.is_empty() { DEFAULT_TAG } else { tag }.to_string();

        let remote = || -> Result<(String, u16), SinkError> {
            let host = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| invalid("missing host"))?;
            // url keeps the brackets on IPv6 literals
            let host = host.trim_start_matches('[').trim_end_matches(']');
            Ok((host.to_string(), url.port().unwrap_or(DEFAULT_PORT)))
        };

        let transport = match url.scheme() {
            "local" => Transport::Local,
            "udp" => {
                let (host, port) = remote()?;
                Transport::Udp { host, port }
            }
            "tcp" => {
                let (host, port) = remote()?;
                Transport::Tcp { host, port }
            }
            other => return Err(invalid(&format!("unsupported scheme {other:?}"))),
        };

        Ok(Self { transport, tag })
    }
}

/// Sends events to a syslog daemon.
#[derive(Debug)]
pub struct SyslogSink {
    tag: String,
    outbox: Outbox<Event>,
}

impl SyslogSink {
    /// Parse `uri` and connect to the daemon it names.
    pub fn connect(uri: &str) -> Result<Self, SinkError> {
        let target = SyslogTarget::parse(uri)?;

        let formatter = Formatter3164 {
            facility: Facility::LOG_DAEMON,
            hostname: None,
            process: target.tag.clone(),
            pid: std::process::id(),
        };

        let mut logger = match &target.transport {
            Transport::Local => syslog::unix(formatter).map_err(|e| syslog_failure(uri, e))?,
            Transport::Udp { host, port } => {
                let server = resolve(host, *port)?;
                let local: SocketAddr = if server.is_ipv4() {
                    ([0, 0, 0, 0], 0).into()
                } else {
                    ([0u16; 8], 0).into()
                };
                syslog::udp(formatter, local, server).map_err(|e| syslog_failure(uri, e))?
            }
            Transport::Tcp { host, port } => {
                let server = resolve(host, *port)?;
                syslog::tcp(formatter, server).map_err(|e| syslog_failure(uri, e))?
            }
        };

        let outbox = Outbox::spawn("syslog", QUEUE_DEPTH, move |event: Event| {
            send(&mut logger, &event)
        })?;

        tracing::info!(uri = %uri, tag = %target.tag, "Syslog sink connected");
        Ok(Self {
            tag: target.tag,
            outbox,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Handler for SyslogSink {
    fn name(&self) -> &'static str {
        "syslog"
    }

    fn on_event(&self, event: &Event) -> Result<(), SinkError> {
        self.outbox.push(event.clone())
    }
}

fn send(logger: &mut Logger<LoggerBackend, Formatter3164>, event: &Event) -> Result<(), SinkError> {
    let sent = match event.code.severity() {
        Severity::Error => logger.err(event),
        Severity::Warning => logger.warning(event),
        Severity::Info => logger.info(event),
    };
    sent.map_err(|e| syslog_failure("daemon", e))?;
    // stream transports buffer
    logger
        .backend
        .flush()
        .map_err(|e| syslog_failure("daemon", e))
}

fn syslog_failure(target: &str, reason: impl std::fmt::Display) -> SinkError {
    SinkError::Syslog {
        target: target.to_string(),
        reason: reason.to_string(),
    }
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, SinkError> {
    let target = format!("{host}:{port}");
    (host, port)
        .to_socket_addrs()
        .map_err(|source| SinkError::Connect {
            addr: target.clone(),
            source,
        })?
        .next()
        .ok_or_else(|| SinkError::Connect {
            addr: target,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventCode;

    #[test]
    fn test_parse_local() {
        let t = SyslogTarget::parse("local:").unwrap();
        assert_eq!(t.transport, Transport::Local);
        assert_eq!(t.tag, DEFAULT_TAG);

        let t = SyslogTarget::parse("local:/nlmtsrv").unwrap();
        assert_eq!(t.transport, Transport::Local);
        assert_eq!(t.tag, "nlmtsrv");
    }

    #[test]
    fn test_parse_udp_and_tcp() {
        let t = SyslogTarget::parse("udp://logsrv:514/nlmtsrv").unwrap();
        assert_eq!(
            t.transport,
            Transport::Udp { host: "logsrv".into(), port: 514 }
        );
        assert_eq!(t.tag, "nlmtsrv");

        let t = SyslogTarget::parse("tcp://logsrv:8514/").unwrap();
        assert_eq!(
            t.transport,
            Transport::Tcp { host: "logsrv".into(), port: 8514 }
        );
        assert_eq!(t.tag, DEFAULT_TAG);

        let t = SyslogTarget::parse("udp://logsrv").unwrap();
        assert_eq!(
            t.transport,
            Transport::Udp { host: "logsrv".into(), port: DEFAULT_PORT }
        );
    }

    #[test]
    fn test_parse_rejects_bad_uris() {
        assert!(matches!(
            SyslogTarget::parse("http://logsrv/"),
            Err(SinkError::SyslogUri { .. })
        ));
        assert!(SyslogTarget::parse("not a uri").is_err());
    }

    #[test]
    fn test_udp_delivery() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let sink = SyslogSink::connect(&format!("udp://127.0.0.1:{port}/nlmtsrv")).unwrap();
        assert_eq!(sink.tag(), "nlmtsrv");
        sink.on_event(&Event::new(EventCode::ListenerError, "bind failed")).unwrap();

        let mut line = String::new();
        let mut buf = [0u8; 2048];
        while !line.ends_with("bind failed") {
            let n = receiver.recv(&mut buf).unwrap();
            line.push_str(std::str::from_utf8(&buf[..n]).unwrap());
        }
        // daemon(3) * 8 + err(3)
        assert!(line.starts_with("<27>"), "line {line:?}");
        assert!(line.contains("nlmtsrv["), "line {line:?}");
    }

    #[test]
    fn test_tcp_delivery_is_queued() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let sink = SyslogSink::connect(&format!("tcp://127.0.0.1:{port}/")).unwrap();
        let (conn, _) = listener.accept().unwrap();
        conn.set_read_timeout(Some(std::time::Duration::from_secs(5)))
            .unwrap();

        sink.on_event(&Event::new(EventCode::ServerStart, "up")).unwrap();

        let mut received = Vec::new();
        let mut buf = [0u8; 512];
        let mut conn = conn;
        while !String::from_utf8_lossy(&received).contains("]: up") {
            let n = std::io::Read::read(&mut conn, &mut buf).unwrap();
            assert!(n > 0, "connection closed early");
            received.extend_from_slice(&buf[..n]);
        }
        // daemon(3) * 8 + info(6)
        assert!(received.starts_with(b"<30>"));
    }
}
