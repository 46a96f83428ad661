//! Server configuration and its defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::events::{ConsoleSink, Event, MultiHandler, NetPrint};
use crate::policy::{AllowFills, AllowStamp, Filler, HmacKey, IpVersion};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 2112;
/// Default `-b` value.
pub const DEFAULT_BIND_ADDRS: &str = ":2112";
/// Default `-d` value (no maximum).
pub const DEFAULT_MAX_DURATION: &str = "0";
/// Default `-i` value.
pub const DEFAULT_MIN_INTERVAL: &str = "10ms";
/// Default `--timeout` value.
pub const DEFAULT_SERVER_TIMEOUT: &str = "1m";
/// Default `-l` value (no maximum).
pub const DEFAULT_MAX_LENGTH: usize = 0;
/// Default `--pburst` value.
pub const DEFAULT_PACKET_BURST: usize = 5;
/// Default `--ttl` value (use the OS default).
pub const DEFAULT_TTL: u32 = 0;
/// Default `--tstamp` value.
pub const DEFAULT_ALLOW_STAMP: &str = "dual";
/// Default `--fill` value.
pub const DEFAULT_SERVER_FILL: &str = "rand";
/// Default `--allow-fills` value.
pub const DEFAULT_ALLOW_FILLS: &str = "rand";
/// Default `--outdir` value.
pub const DEFAULT_OUTPUT_DIR: &str = ".";

/// `-o` value selecting the default file name.
pub const DEFAULT_NAMING_FLAG: &str = "d";
/// `-o` value selecting stdout.
pub const STDOUT_FLAG: &str = "-";

const JSON_EXT: &str = ".json";
const GZ_EXT: &str = ".gz";
const JSON_GZ_EXT: &str = ".json.gz";

/// Where JSON results go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputDestination {
    #[default]
    Disabled,
    /// Generated file name inside this directory.
    DefaultNaming { dir: PathBuf },
    /// Exactly the path the operator gave (`-` is stdout).
    ExplicitPath(PathBuf),
}

impl OutputDestination {
    /// Decide from the `-o` and `--outdir` flags.
    pub fn from_flags(output: &str, outdir: &str) -> Self {
        match output {
            "" => Self::Disabled,
            DEFAULT_NAMING_FLAG => Self::DefaultNaming {
                dir: PathBuf::from(outdir),
            },
            path => Self::ExplicitPath(PathBuf::from(path)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// The file to write, given the name the engine would generate.
    pub fn output_file(&self, default_stem: &str) -> Option<OutputFile> {
        match self {
            Self::Disabled => None,
            Self::DefaultNaming { dir } => Some(OutputFile::for_path(&dir.join(default_stem))),
            Self::ExplicitPath(path) => Some(OutputFile::for_path(path)),
        }
    }
}

/// A concrete output file and whether it is gzipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub gzip: bool,
}

impl OutputFile {
    /// Apply the extension rules.
    ///
    /// No extension gets `.json.gz`, `.gz` becomes `.json.gz`, `.json` is left
    /// alone and not gzipped, anything else is gzipped as is. Stdout is never
    /// gzipped.
    pub fn for_path(path: &Path) -> Self {
        if path.as_os_str() == STDOUT_FLAG {
            return Self {
                path: path.to_path_buf(),
                gzip: false,
            };
        }

        let name = path.to_string_lossy();
        if name.ends_with(JSON_GZ_EXT) {
            return Self {
                path: path.to_path_buf(),
                gzip: true,
            };
        }
        if let Some(stem) = name.strip_suffix(GZ_EXT) {
            return Self {
                path: PathBuf::from(format!("{stem}{JSON_GZ_EXT}")),
                gzip: true,
            };
        }
        if name.ends_with(JSON_EXT) {
            return Self {
                path: path.to_path_buf(),
                gzip: false,
            };
        }
        if path.extension().is_none() {
            return Self {
                path: PathBuf::from(format!("{name}{JSON_GZ_EXT}")),
                gzip: true,
            };
        }
        Self {
            path: path.to_path_buf(),
            gzip: true,
        }
    }

    pub fn is_stdout(&self) -> bool {
        self.path.as_os_str() == STDOUT_FLAG
    }
}

/// Fully resolved server configuration.
///
/// Never mutated once built; the engine takes ownership.
#[derive(Debug)]
pub struct ServerConfig {
    /// Bind address specs, in flag order.
    pub addrs: Vec<String>,
    /// Zero means no maximum.
    pub max_duration: Duration,
    /// Zero means no minimum.
    pub min_interval: Duration,
    /// Zero means no maximum.
    pub max_length: usize,
    pub packet_burst: usize,
    /// Zero means connections never time out.
    pub timeout: Duration,
    pub allow_stamp: AllowStamp,
    pub hmac_key: Option<HmacKey>,
    pub filler: Filler,
    pub allow_fills: AllowFills,
    pub allow_dscp: bool,
    pub ttl: u32,
    pub ip_version: IpVersion,
    pub set_src_ip: bool,
    /// Surface ECN bits to clients; replies are suppressed.
    pub ecn: bool,
    pub thread_lock: bool,
    pub quiet: bool,
    pub really_quiet: bool,
    pub output: OutputDestination,
    pub handler: MultiHandler,
    pub netprint: Option<Arc<NetPrint>>,
}

impl ServerConfig {
    /// Send an event to every sink.
    pub fn emit(&self, event: Event) {
        self.handler.emit(&event);
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addrs: DEFAULT_BIND_ADDRS.split(',').map(str::to_string).collect(),
            max_duration: Duration::ZERO,
            min_interval: Duration::from_millis(10),
            max_length: DEFAULT_MAX_LENGTH,
            packet_burst: DEFAULT_PACKET_BURST,
            timeout: Duration::from_secs(60),
            allow_stamp: AllowStamp::default(),
            hmac_key: None,
            filler: Filler::default(),
            allow_fills: AllowFills::decode(DEFAULT_ALLOW_FILLS),
            allow_dscp: true,
            ttl: DEFAULT_TTL,
            ip_version: IpVersion::default(),
            set_src_ip: false,
            ecn: false,
            thread_lock: false,
            quiet: false,
            really_quiet: false,
            output: OutputDestination::default(),
            handler: MultiHandler::new(vec![Box::new(ConsoleSink::default())]),
            netprint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_destination_from_flags() {
        assert_eq!(OutputDestination::from_flags("", "/tmp"), OutputDestination::Disabled);
        assert_eq!(
            OutputDestination::from_flags("d", "/tmp/out"),
            OutputDestination::DefaultNaming { dir: "/tmp/out".into() }
        );
        assert_eq!(
            OutputDestination::from_flags("results", "/tmp/out"),
            OutputDestination::ExplicitPath("results".into())
        );
        // outdir only matters for default naming
        assert_eq!(
            OutputDestination::from_flags("dd", "/ignored"),
            OutputDestination::ExplicitPath("dd".into())
        );
    }

    #[test]
    fn test_extension_rules() {
        let cases = [
            ("out", "out.json.gz", true),
            ("out.json", "out.json", false),
            ("out.json.gz", "out.json.gz", true),
            ("out.gz", "out.json.gz", true),
            ("out.txt", "out.txt", true),
            ("dir/run1", "dir/run1.json.gz", true),
            ("-", "-", false),
        ];
        for (input, path, gzip) in cases {
            let file = OutputFile::for_path(Path::new(input));
            assert_eq!(file.path, PathBuf::from(path), "input {input}");
            assert_eq!(file.gzip, gzip, "input {input}");
        }
    }

    #[test]
    fn test_output_file() {
        assert_eq!(OutputDestination::Disabled.output_file("x"), None);

        let dest = OutputDestination::DefaultNaming { dir: "/tmp/out".into() };
        let file = dest.output_file("20261019-server").unwrap();
        assert_eq!(file.path, PathBuf::from("/tmp/out/20261019-server.json.gz"));
        assert!(file.gzip);

        let dest = OutputDestination::ExplicitPath("-".into());
        assert!(dest.output_file("ignored").unwrap().is_stdout());
    }

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.addrs, vec![":2112".to_string()]);
        assert_eq!(cfg.allow_stamp, AllowStamp::Dual);
        assert!(cfg.allow_dscp);
        assert_eq!(cfg.handler.names(), vec!["console"]);
        assert!(!cfg.output.is_enabled());
    }
}
