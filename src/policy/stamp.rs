//! Timestamp disclosure policy.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::PolicyError;

/// The most timestamp information the server will hand back to a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllowStamp {
    /// No timestamps at all.
    None,
    /// One of send, receive or midpoint.
    Single,
    /// Both receive and send timestamps.
    #[default]
    Dual,
}

impl AllowStamp {
    /// Decode the `--tstamp` flag. Tokens are case-sensitive.
    pub fn decode(raw: &str) -> Result<Self, PolicyError> {
        match raw {
            "none" => Ok(Self::None),
            "single" => Ok(Self::Single),
            "dual" => Ok(Self::Dual),
            other => Err(PolicyError::UnknownStamp(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Single => "single",
            Self::Dual => "dual",
        }
    }
}

impl FromStr for AllowStamp {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl fmt::Display for AllowStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
