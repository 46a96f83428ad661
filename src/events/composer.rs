//! Event sink composition.

use std::sync::Arc;

use thiserror::Error;

use super::{ConsoleSink, MultiHandler, NetPrint, SinkError};

/// Sink-related flags.
#[derive(Debug, Clone, Default)]
pub struct SinkOptions {
    /// `-q`: hide per-packet events on the console.
    pub quiet: bool,
    /// `--syslog` URI, empty for none.
    pub syslog: String,
    /// `-n` address, empty for none.
    pub netprint: String,
}

/// Why a sink could not be built.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("syslog: {0}")]
    Syslog(#[source] SinkError),

    #[error("netprint: {0}")]
    NetPrint(#[source] SinkError),

    #[error("syslog is not supported on this platform")]
    SyslogUnsupported,
}

/// Build the fan-out handler: console first, then syslog, then netprint.
///
/// The netprint connection is also returned so the caller can close it.
pub fn compose(opts: &SinkOptions) -> Result<(MultiHandler, Option<Arc<NetPrint>>), ComposeError> {
    let mut handler = MultiHandler::new(vec![Box::new(ConsoleSink::new(opts.quiet))]);

    if !opts.syslog.is_empty() {
        #[cfg(unix)]
        {
            let sink = super::SyslogSink::connect(&opts.syslog).map_err(ComposeError::Syslog)?;
            handler.add_handler(Box::new(sink));
        }
        #[cfg(not(unix))]
        return Err(ComposeError::SyslogUnsupported);
    }

    let mut netprint = None;
    if !opts.netprint.is_empty() {
        let np = Arc::new(NetPrint::connect(&opts.netprint).map_err(ComposeError::NetPrint)?);
        handler.add_handler(Box::new(np.clone()));
        netprint = Some(np);
    }

    tracing::debug!(sinks = ?handler.names(), "Event sinks composed");
    Ok((handler, netprint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_console_only_by_default() {
        let (handler, netprint) = compose(&SinkOptions::default()).unwrap();
        assert_eq!(handler.names(), vec!["console"]);
        assert!(netprint.is_none());
    }

    #[test]
    fn test_netprint_appended_after_console() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let opts = SinkOptions {
            netprint: listener.local_addr().unwrap().to_string(),
            ..Default::default()
        };

        let (handler, netprint) = compose(&opts).unwrap();
        assert_eq!(handler.names(), vec!["console", "netprint"]);
        assert!(netprint.unwrap().close());
    }

    #[test]
    fn test_unreachable_netprint_is_netprint_error() {
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let opts = SinkOptions {
            netprint: format!("127.0.0.1:{port}"),
            ..Default::default()
        };
        assert!(matches!(compose(&opts), Err(ComposeError::NetPrint(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_bad_syslog_uri_is_syslog_error() {
        let opts = SinkOptions {
            syslog: "ftp://logsrv/".into(),
            ..Default::default()
        };
        assert!(matches!(compose(&opts), Err(ComposeError::Syslog(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_syslog_before_netprint() {
        let udp = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let tcp = TcpListener::bind("127.0.0.1:0").unwrap();
        let opts = SinkOptions {
            quiet: true,
            syslog: format!("udp://127.0.0.1:{}/", udp.local_addr().unwrap().port()),
            netprint: tcp.local_addr().unwrap().to_string(),
        };

        let (handler, _) = compose(&opts).unwrap();
        assert_eq!(handler.names(), vec!["console", "syslog", "netprint"]);
    }
}
