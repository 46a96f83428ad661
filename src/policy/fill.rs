//! Payload filler policies and the allow-fills pattern list.
//!
//! # Design Decisions
//! - The factory registry is a static slice; help text and the decoder read
//!   the same table so they cannot drift apart
//! - `none` is not a factory: it means "echo the client payload"
//! - Allow-fills patterns only understand `*`, nothing else is special

use std::fmt;

use serde::Serialize;

use super::PolicyError;

/// Pattern used by `pattern:` when no bytes are given ("irtt" in ASCII).
pub const DEFAULT_PATTERN: &[u8] = &[0x69, 0x72, 0x74, 0x74];

/// Token meaning "echo the client payload".
pub const NO_FILL: &str = "none";

/// A concrete payload fill policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filler {
    /// Echo whatever the client sent.
    None,
    /// Random bytes.
    #[default]
    Rand,
    /// Repeating byte pattern.
    Pattern(Vec<u8>),
}

impl Filler {
    /// Decode a `--fill` token against the given registry.
    pub fn decode(raw: &str, factories: &[FillerFactory]) -> Result<Self, PolicyError> {
        if raw == NO_FILL {
            return Ok(Self::None);
        }

        for factory in factories {
            if factory.matches(raw) {
                return (factory.build)(&raw[factory.token.len()..]);
            }
        }

        Err(PolicyError::UnknownFiller {
            token: raw.to_string(),
            choices: choices(factories),
        })
    }

    /// Whether replies echo the request payload.
    pub fn is_echo(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for Filler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str(NO_FILL),
            Self::Rand => f.write_str("rand"),
            Self::Pattern(bytes) => write!(f, "pattern:{}", hex::encode(bytes)),
        }
    }
}

impl Serialize for Filler {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A registered filler constructor.
///
/// A token ending in `:` takes the remainder of the flag as its argument.
#[derive(Clone, Copy)]
pub struct FillerFactory {
    pub token: &'static str,
    pub usage: &'static str,
    build: fn(&str) -> Result<Filler, PolicyError>,
}

impl FillerFactory {
    fn matches(&self, raw: &str) -> bool {
        if self.token.ends_with(':') {
            raw.starts_with(self.token)
        } else {
            raw == self.token
        }
    }
}

impl fmt::Debug for FillerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillerFactory")
            .field("token", &self.token)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}

/// Every filler the server knows how to build, in help-text order.
pub static FILLER_FACTORIES: &[FillerFactory] = &[
    FillerFactory {
        token: "rand",
        usage: "rand: use random bytes",
        build: build_rand,
    },
    FillerFactory {
        token: "pattern:",
        usage: "pattern:XX: use repeating pattern of hex (default 69727474)",
        build: build_pattern,
    },
];

fn build_rand(_arg: &str) -> Result<Filler, PolicyError> {
    Ok(Filler::Rand)
}

fn build_pattern(arg: &str) -> Result<Filler, PolicyError> {
    if arg.is_empty() {
        return Ok(Filler::Pattern(DEFAULT_PATTERN.to_vec()));
    }
    hex::decode(arg)
        .map(Filler::Pattern)
        .map_err(|e| PolicyError::InvalidFillArgument {
            token: format!("pattern:{arg}"),
            reason: e.to_string(),
        })
}

fn choices(factories: &[FillerFactory]) -> String {
    std::iter::once(NO_FILL)
        .chain(factories.iter().map(|f| f.token))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Glob patterns restricting which client fill requests are honored.
///
/// An empty list rejects every fill request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AllowFills(Vec<String>);

impl AllowFills {
    /// Split a comma separated `--allow-fills` value, preserving order.
    pub fn decode(raw: &str) -> Self {
        if raw.is_empty() {
            return Self(Vec::new());
        }
        Self(raw.split(',').map(str::to_string).collect())
    }

    /// Whether a requested fill token matches any pattern.
    pub fn allows(&self, token: &str) -> bool {
        self.0.iter().any(|pattern| glob_match(pattern, token))
    }

    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `*` matches any run of characters, everything else matches literally.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    // last `*` seen and the text position it was tried against
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((spi, sti)) = star {
            pi = spi + 1;
            ti = sti + 1;
            star = Some((spi, sti + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}
