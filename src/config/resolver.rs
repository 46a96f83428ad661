//! Configuration resolution.
//!
//! # Responsibilities
//! - Decode every policy flag
//! - Apply cross-flag rules (ECN forces source IP, DSCP negation, -4/-6)
//! - Decide the output destination
//! - Compose event sinks last, after every decode has succeeded
//!
//! # Design Decisions
//! - First error wins and nothing is partially applied
//! - Syslog failures are runtime errors, everything else is a bad command line

use thiserror::Error;

use crate::cli::Cli;
use crate::config::schema::{OutputDestination, ServerConfig};
use crate::events::{compose, ComposeError, SinkOptions};
use crate::lifecycle::exit::ExitClass;
use crate::policy::{
    AllowFills, AllowStamp, Filler, FillerFactory, HmacKey, IpVersion, PolicyError,
};

/// Why a command line could not become a `ServerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Sink(#[from] ComposeError),
}

impl ConfigError {
    pub fn exit_class(&self) -> ExitClass {
        match self {
            Self::Policy(_) => ExitClass::BadCommandLine,
            Self::Sink(ComposeError::NetPrint(_)) => ExitClass::BadCommandLine,
            Self::Sink(ComposeError::Syslog(_)) => ExitClass::RuntimeError,
            Self::Sink(ComposeError::SyslogUnsupported) => ExitClass::BadCommandLine,
        }
    }
}

/// Turn parsed flags into a `ServerConfig`.
pub fn resolve(cli: &Cli, factories: &[FillerFactory]) -> Result<ServerConfig, ConfigError> {
    let ip_version = IpVersion::from_flags(cli.ipv4, cli.ipv6, IpVersion::DualStack);
    if cli.ipv4 && cli.ipv6 {
        tracing::warn!("Both -4 and -6 given, using IPv4 only");
    }

    let allow_stamp = AllowStamp::decode(&cli.tstamp)?;
    let filler = Filler::decode(&cli.fill, factories)?;
    let hmac_key = HmacKey::decode(&cli.hmac)?;
    let allow_fills = AllowFills::decode(&cli.allow_fills);
    let output = OutputDestination::from_flags(&cli.output, &cli.outdir);

    let (handler, netprint) = compose(&SinkOptions {
        quiet: cli.quiet,
        syslog: cli.syslog.clone(),
        netprint: cli.netprint.clone(),
    })?;

    let config = ServerConfig {
        addrs: cli.bind.split(',').map(str::to_string).collect(),
        max_duration: cli.max_duration,
        min_interval: cli.min_interval,
        max_length: cli.max_length,
        packet_burst: cli.packet_burst,
        timeout: cli.timeout,
        allow_stamp,
        hmac_key,
        filler,
        allow_fills,
        allow_dscp: !cli.no_dscp,
        ttl: cli.ttl,
        ip_version,
        set_src_ip: cli.set_src_ip || cli.ecn,
        ecn: cli.ecn,
        thread_lock: cli.thread,
        quiet: cli.quiet,
        really_quiet: cli.really_quiet,
        output,
        handler,
        netprint,
    };

    tracing::debug!(
        addrs = ?config.addrs,
        ip_version = %config.ip_version,
        allow_stamp = %config.allow_stamp,
        filler = %config.filler,
        hmac = config.hmac_key.is_some(),
        output = ?config.output,
        "Configuration resolved"
    );

    Ok(config)
}
