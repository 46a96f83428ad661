//! Command-line option parser.
//!
//! Values are typed here but not validated; policy strings are decoded by
//! `config::resolver`.

use std::ffi::OsString;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::config::schema::{
    DEFAULT_ALLOW_FILLS, DEFAULT_ALLOW_STAMP, DEFAULT_BIND_ADDRS, DEFAULT_MAX_DURATION,
    DEFAULT_MIN_INTERVAL, DEFAULT_OUTPUT_DIR, DEFAULT_SERVER_FILL, DEFAULT_SERVER_TIMEOUT,
};
use crate::lifecycle::exit::ExitClass;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nlmt-server",
    about = "Network latency measurement server",
    disable_version_flag = true
)]
pub struct Cli {
    /// Bind addresses, comma separated (:port, host, host:port, %iface, %iface:port)
    #[arg(short = 'b', value_name = "addresses", default_value = DEFAULT_BIND_ADDRS)]
    pub bind: String,

    /// Max test duration, or 0 for no maximum
    #[arg(short = 'd', value_name = "duration", value_parser = parse_duration, default_value = DEFAULT_MAX_DURATION)]
    pub max_duration: Duration,

    /// Min send interval, or 0 for no minimum
    #[arg(short = 'i', value_name = "interval", value_parser = parse_duration, default_value = DEFAULT_MIN_INTERVAL)]
    pub min_interval: Duration,

    /// Max packet length, or 0 for no maximum
    #[arg(short = 'l', value_name = "length", default_value_t = 0)]
    pub max_length: usize,

    /// Print events to a remote log server, e.g. 0.0.0.0:50009
    #[arg(short = 'n', value_name = "address", default_value = "")]
    pub netprint: String,

    /// Timestamp modes to allow (none, single, dual)
    #[arg(long = "tstamp", value_name = "modes", default_value = DEFAULT_ALLOW_STAMP)]
    pub tstamp: String,

    /// HMAC key for all packets (0x prefix for hex)
    #[arg(long = "hmac", value_name = "key", default_value = "")]
    pub hmac: String,

    /// Log events to syslog (local:, local:/tag, udp://host:port/tag, tcp://host:port/tag)
    #[arg(long = "syslog", value_name = "uri", default_value = "")]
    pub syslog: String,

    /// Timeout for closing connections with no requests, 0 for none
    #[arg(long = "timeout", value_name = "dur", value_parser = parse_duration, default_value = DEFAULT_SERVER_TIMEOUT)]
    pub timeout: Duration,

    /// Packet burst allowed before enforcing the minimum interval
    #[arg(long = "pburst", value_name = "#", default_value_t = crate::config::schema::DEFAULT_PACKET_BURST)]
    pub packet_burst: usize,

    /// Payload fill if not requested (none, rand, pattern:XX)
    #[arg(long = "fill", value_name = "fill", default_value = DEFAULT_SERVER_FILL)]
    pub fill: String,

    /// Comma separated patterns of fill requests to allow, "" allows none
    #[arg(long = "allow-fills", value_name = "fills", default_value = DEFAULT_ALLOW_FILLS)]
    pub allow_fills: String,

    /// IPv4 only
    #[arg(short = '4')]
    pub ipv4: bool,

    /// IPv6 only
    #[arg(short = '6')]
    pub ipv6: bool,

    /// IP time to live, 0 for the OS default
    #[arg(long = "ttl", value_name = "ttl", default_value_t = crate::config::schema::DEFAULT_TTL)]
    pub ttl: u32,

    /// Don't allow setting DSCP
    #[arg(long = "no-dscp")]
    pub no_dscp: bool,

    /// Set source IP on all outgoing packets from unspecified-address listeners
    #[arg(long = "set-src-ip")]
    pub set_src_ip: bool,

    /// Ship ECN bits to be logged by the client; forces --set-src-ip, disables UDP replies
    #[arg(long = "ecn")]
    pub ecn: bool,

    /// Pin request handling to dedicated threads
    #[arg(long = "thread")]
    pub thread: bool,

    /// Show version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Write JSON output to file ('d' for default name, '-' for stdout)
    #[arg(short = 'o', value_name = "file", default_value = "")]
    pub output: String,

    /// Output directory, used only with the default file name
    #[arg(long = "outdir", value_name = "dir", default_value = DEFAULT_OUTPUT_DIR)]
    pub outdir: String,

    /// Quiet, suppress per-packet output
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Really quiet, suppress all output except errors
    #[arg(short = 'Q')]
    pub really_quiet: bool,
}

/// A parse that ended the program instead of producing options.
#[derive(Debug)]
pub struct CliExit {
    pub class: ExitClass,
    pub message: String,
}

impl Cli {
    /// Parse `args` (including the program name).
    ///
    /// Help, unknown flags and malformed values all classify as a bad
    /// command line; the message already carries usage.
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, CliExit>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| {
            let message = match e.kind() {
                ErrorKind::DisplayHelp => Self::command().render_help().to_string(),
                _ => e.render().to_string(),
            };
            CliExit {
                class: ExitClass::BadCommandLine,
                message,
            }
        })
    }

    /// One-line usage for diagnostics.
    pub fn usage() -> String {
        Self::command().render_usage().to_string()
    }
}

/// Text printed by `-v`.
pub fn version_text() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn parse_duration(s: &str) -> Result<Duration, humantime::DurationError> {
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    humantime::parse_duration(s)
}
