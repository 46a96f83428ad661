//! Bind address expansion.
//!
//! # Responsibilities
//! - Parse `:port`, `host`, `host:port`, `[v6]:port`, `%iface[:port]`
//! - Resolve hosts and filter by IP version
//!
//! # Design Decisions
//! - An unspecified dual-stack listener binds `[::]` only; the kernel maps
//!   IPv4 onto it
//! - Interface forms parse but do not expand

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use super::EngineError;
use crate::config::schema::DEFAULT_PORT;
use crate::policy::IpVersion;

/// A parsed bind address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindSpec {
    /// `:port`
    Unspecified { port: u16 },
    /// `host` or `host:port`
    Host { host: String, port: u16 },
    /// `%iface` or `%iface:port`, iface may contain `*`
    Interface { pattern: String, port: u16 },
}

impl BindSpec {
    pub fn parse(spec: &str) -> Result<Self, EngineError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(invalid(spec, "empty"));
        }

        if let Some(iface) = spec.strip_prefix('%') {
            let (pattern, port) = split_port(spec, iface)?;
            if pattern.is_empty() {
                return Err(invalid(spec, "missing interface name"));
            }
            return Ok(Self::Interface {
                pattern: pattern.to_string(),
                port,
            });
        }

        if let Some(port) = spec.strip_prefix(':') {
            return Ok(Self::Unspecified {
                port: parse_port(spec, port)?,
            });
        }

        // bare IPv6 literal, no port
        if let Ok(ip) = spec.parse::<Ipv6Addr>() {
            return Ok(Self::Host {
                host: ip.to_string(),
                port: DEFAULT_PORT,
            });
        }

        let (host, port) = split_port(spec, spec)?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid(spec, "missing host"));
        }
        Ok(Self::Host {
            host: host.to_string(),
            port,
        })
    }

    /// Resolve to concrete socket addresses allowed by `ip_version`.
    pub async fn expand(
        &self,
        original: &str,
        ip_version: IpVersion,
    ) -> Result<Vec<SocketAddr>, EngineError> {
        let addrs: Vec<SocketAddr> = match self {
            Self::Unspecified { port } => {
                let ip: IpAddr = match ip_version {
                    IpVersion::V4 => Ipv4Addr::UNSPECIFIED.into(),
                    IpVersion::V6 | IpVersion::DualStack => Ipv6Addr::UNSPECIFIED.into(),
                };
                vec![SocketAddr::new(ip, *port)]
            }
            Self::Host { host, port } => tokio::net::lookup_host((host.as_str(), *port))
                .await
                .map_err(|source| EngineError::Resolve {
                    addr: original.to_string(),
                    source,
                })?
                .filter(|addr| ip_version.admits(addr))
                .collect(),
            Self::Interface { .. } => {
                return Err(EngineError::UnsupportedAddress(original.to_string()));
            }
        };

        if addrs.is_empty() {
            return Err(EngineError::NoAddress {
                addr: original.to_string(),
                ip_version: ip_version.to_string(),
            });
        }

        let mut unique = Vec::with_capacity(addrs.len());
        for addr in addrs {
            if !unique.contains(&addr) {
                unique.push(addr);
            }
        }
        Ok(unique)
    }
}

/// Split a trailing `:port`, honoring `[v6]:port` brackets.
fn split_port<'a>(spec: &str, s: &'a str) -> Result<(&'a str, u16), EngineError> {
    if s.starts_with('[') {
        return match s.rsplit_once("]:") {
            Some((host, port)) => Ok((&host[1..], parse_port(spec, port)?)),
            None if s.ends_with(']') => Ok((&s[1..s.len() - 1], DEFAULT_PORT)),
            None => Err(invalid(spec, "unterminated '['")),
        };
    }
    match s.rsplit_once(':') {
        Some((host, port)) => Ok((host, parse_port(spec, port)?)),
        None => Ok((s, DEFAULT_PORT)),
    }
}

fn parse_port(spec: &str, port: &str) -> Result<u16, EngineError> {
    port.parse::<u16>()
        .map_err(|e| invalid(spec, &format!("bad port {port:?}: {e}")))
}

fn invalid(spec: &str, reason: &str) -> EngineError {
    EngineError::InvalidAddress {
        addr: spec.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(h: &str, port: u16) -> BindSpec {
        BindSpec::Host { host: h.into(), port }
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!(BindSpec::parse(":2113").unwrap(), BindSpec::Unspecified { port: 2113 });
        assert_eq!(BindSpec::parse("localhost").unwrap(), host("localhost", DEFAULT_PORT));
        assert_eq!(BindSpec::parse("10.0.0.1:9000").unwrap(), host("10.0.0.1", 9000));
        assert_eq!(BindSpec::parse("[::1]:9000").unwrap(), host("::1", 9000));
        assert_eq!(BindSpec::parse("[::1]").unwrap(), host("::1", DEFAULT_PORT));
        assert_eq!(BindSpec::parse("fe80::1").unwrap(), host("fe80::1", DEFAULT_PORT));
        assert_eq!(
            BindSpec::parse("%eth*").unwrap(),
            BindSpec::Interface { pattern: "eth*".into(), port: DEFAULT_PORT }
        );
        assert_eq!(
            BindSpec::parse("%eth0:2114").unwrap(),
            BindSpec::Interface { pattern: "eth0".into(), port: 2114 }
        );
    }

    #[test]
    fn test_parse_errors() {
        for bad in ["", ":", ":http", "host:99999", "%", "[::1", ":2112x"] {
            assert!(
                matches!(BindSpec::parse(bad), Err(EngineError::InvalidAddress { .. })),
                "spec {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_expand_unspecified() {
        let spec = BindSpec::Unspecified { port: 2112 };
        let v4 = spec.expand(":2112", IpVersion::V4).await.unwrap();
        assert_eq!(v4, vec!["0.0.0.0:2112".parse().unwrap()]);

        let dual = spec.expand(":2112", IpVersion::DualStack).await.unwrap();
        assert_eq!(dual, vec!["[::]:2112".parse().unwrap()]);
    }

    #[tokio::test]
    async fn test_expand_filters_ip_version() {
        let spec = host("127.0.0.1", 2112);
        assert_eq!(spec.expand("127.0.0.1", IpVersion::V4).await.unwrap().len(), 1);
        assert!(matches!(
            spec.expand("127.0.0.1", IpVersion::V6).await,
            Err(EngineError::NoAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_expand_interface_unsupported() {
        let spec = BindSpec::parse("%lo").unwrap();
        assert!(matches!(
            spec.expand("%lo", IpVersion::DualStack).await,
            Err(EngineError::UnsupportedAddress(_))
        ));
    }
}
