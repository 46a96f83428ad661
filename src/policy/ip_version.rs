//! IP version selection from the `-4` / `-6` flags.

use std::fmt;
use std::net::SocketAddr;

use serde::Serialize;

/// Address families the server listens on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum IpVersion {
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
    #[serde(rename = "IPv4+6")]
    #[default]
    DualStack,
}

impl IpVersion {
    /// Resolve the two independent flags against a default.
    ///
    /// When both flags are set IPv4 wins, matching declaration order.
    pub fn from_flags(ipv4: bool, ipv6: bool, default: IpVersion) -> Self {
        if ipv4 {
            return Self::V4;
        }
        if ipv6 {
            return Self::V6;
        }
        default
    }

    /// Whether a resolved address belongs to an allowed family.
    pub fn admits(&self, addr: &SocketAddr) -> bool {
        match self {
            Self::V4 => addr.is_ipv4(),
            Self::V6 => addr.is_ipv6(),
            Self::DualStack => true,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
            Self::DualStack => f.write_str("IPv4+6"),
        }
    }
}
