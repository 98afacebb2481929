//! Host network interface enumeration
//!
//! This module handles:
//! - Interface/address enumeration in platform order
//! - Hardware address lookup by interface name
//! - Selection of the first usable IPv4 address

use crate::error::TelemetryError;
use if_addrs::get_if_addrs;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::{debug, warn};

/// One address bound to a host interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub name: String,
    pub ip: IpAddr,
}

/// Enumerates interfaces and their hardware addresses.
pub trait InterfaceSource: Send + Sync {
    /// Bound addresses, in the platform's enumeration order.
    fn addresses(&self) -> Result<Vec<InterfaceAddress>, TelemetryError>;

    /// Hardware address of the named interface, if it exists and has one.
    fn hardware_address(&self, name: &str) -> Result<Option<[u8; 6]>, TelemetryError>;
}

/// Interfaces of the running host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostInterfaces;

impl InterfaceSource for HostInterfaces {
    fn addresses(&self) -> Result<Vec<InterfaceAddress>, TelemetryError> {
        debug!("Enumerating network interfaces...");
        let if_addrs = get_if_addrs().map_err(|e| TelemetryError::query("interface enumeration", e))?;

        Ok(if_addrs
            .into_iter()
            .map(|if_addr| InterfaceAddress {
                ip: if_addr.ip(),
                name: if_addr.name,
            })
            .collect())
    }

    fn hardware_address(&self, name: &str) -> Result<Option<[u8; 6]>, TelemetryError> {
        match mac_address::mac_address_by_name(name) {
            Ok(mac) => Ok(mac.map(|m| m.bytes())),
            Err(e) => Err(TelemetryError::query("hardware address lookup", e)),
        }
    }
}

/// First non-loopback IPv4 address, or "" when there is none.
pub fn first_ipv4_address(source: &dyn InterfaceSource) -> String {
    let addresses = match source.addresses() {
        Ok(addresses) => addresses,
        Err(e) => {
            warn!("Interface enumeration failed: {}", e);
            return String::new();
        }
    };

    addresses
        .iter()
        .find_map(|addr| match addr.ip {
            IpAddr::V4(v4) if !v4.is_loopback() => {
                debug!("Using {} from interface {}", v4, addr.name);
                Some(v4.to_string())
            }
            _ => None,
        })
        .unwrap_or_default()
}

/// Six uppercase hex pairs joined by colons.
pub fn format_mac(bytes: &[u8; 6]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table(Vec<(&'static str, &'static str)>);

    impl InterfaceSource for Table {
        fn addresses(&self) -> Result<Vec<InterfaceAddress>, TelemetryError> {
            Ok(self
                .0
                .iter()
                .map(|(name, ip)| InterfaceAddress {
                    name: name.to_string(),
                    ip: ip.parse().unwrap(),
                })
                .collect())
        }

        fn hardware_address(&self, _name: &str) -> Result<Option<[u8; 6]>, TelemetryError> {
            Ok(None)
        }
    }

    struct Broken;

    impl InterfaceSource for Broken {
        fn addresses(&self) -> Result<Vec<InterfaceAddress>, TelemetryError> {
            Err(TelemetryError::TransientQueryFailure("netlink closed".into()))
        }

        fn hardware_address(&self, _name: &str) -> Result<Option<[u8; 6]>, TelemetryError> {
            Err(TelemetryError::TransientQueryFailure("netlink closed".into()))
        }
    }

    #[test]
    fn test_skips_loopback_and_ipv6() {
        let table = Table(vec![("lo", "127.0.0.1"), ("eth0", "::1"), ("wlan0", "192.168.1.5")]);
        assert_eq!(first_ipv4_address(&table), "192.168.1.5");
    }

    #[test]
    fn test_first_match_wins() {
        let table = Table(vec![
            ("wlan0", "fe80::1"),
            ("rmnet0", "10.64.3.7"),
            ("wlan0", "192.168.1.5"),
        ]);
        assert_eq!(first_ipv4_address(&table), "10.64.3.7");
    }

    #[test]
    fn test_no_usable_address() {
        let table = Table(vec![("lo", "127.0.0.1"), ("lo", "::1")]);
        assert_eq!(first_ipv4_address(&table), "");
        assert_eq!(first_ipv4_address(&Broken), "");
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(format_mac(&[0xa1, 0xb2, 0xc3, 0x04, 0xe5, 0xf6]), "A1:B2:C3:04:E5:F6");
    }

    #[test]
    fn test_host_enumeration_does_not_panic() {
        let _ = first_ipv4_address(&HostInterfaces);
    }
}
