// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Network interface selection and broadcast address derivation.
//!
//! The broadcast sender needs a concrete local interface: its address to bind
//! to, and its netmask to derive the segment's directed broadcast address as
//! `(ip & mask) | !mask`.
//!
//! - Linux: parses `ip -4 addr show` output, which carries the CIDR prefix.
//! - Elsewhere (or when `ip` is unavailable, e.g. minimal containers): falls
//!   back to the `local_ip_address` crate. That path has no netmask, so the
//!   limited broadcast address 255.255.255.255 is used instead.

use std::io;
use std::net::Ipv4Addr;

/// A selected local IPv4 interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetInterface {
    /// Interface name, when the platform exposes one.
    pub name: Option<String>,
    /// Local address; broadcast sender and unicast socket bind here.
    pub addr: Ipv4Addr,
    /// CIDR prefix length, when known.
    pub prefix_len: Option<u8>,
}

impl NetInterface {
    /// Directed broadcast address for this interface's subnet, or the
    /// limited broadcast address when the netmask is unknown.
    pub fn broadcast(&self) -> Ipv4Addr {
        match self.prefix_len {
            Some(prefix) => broadcast_address(self.addr, prefix),
            None => {
                log::warn!(
                    "[iface] no netmask for {}, using limited broadcast",
                    self.addr
                );
                Ipv4Addr::BROADCAST
            }
        }
    }
}

/// Compute `(ip & mask) | !mask` for a CIDR prefix length.
pub fn broadcast_address(addr: Ipv4Addr, prefix_len: u8) -> Ipv4Addr {
    let mask = match prefix_len {
        0 => 0u32,
        1..=31 => u32::MAX << (32 - u32::from(prefix_len)),
        _ => u32::MAX,
    };
    let ip = u32::from(addr);
    Ipv4Addr::from((ip & mask) | !mask)
}

/// Resolve the configured interface, or pick the primary one.
///
/// `name = None` selects the first non-loopback interface; a named interface
/// that cannot be found is an error rather than a silent fallback.
pub fn resolve_interface(name: Option<&str>) -> io::Result<NetInterface> {
    let interfaces = list_interfaces()?;

    let selected = match name {
        Some(wanted) => interfaces
            .into_iter()
            .find(|iface| iface.name.as_deref() == Some(wanted))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("broadcast interface '{}' not found", wanted),
                )
            })?,
        None => interfaces
            .into_iter()
            .find(|iface| !iface.addr.is_loopback())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "no non-loopback IPv4 interface available",
                )
            })?,
    };

    log::debug!(
        "[iface] selected {} addr={} prefix={:?}",
        selected.name.as_deref().unwrap_or("?"),
        selected.addr,
        selected.prefix_len
    );
    Ok(selected)
}

/// Enumerate local IPv4 interfaces.
fn list_interfaces() -> io::Result<Vec<NetInterface>> {
    #[cfg(target_os = "linux")]
    {
        match list_interfaces_ip_command() {
            Ok(interfaces) if !interfaces.is_empty() => return Ok(interfaces),
            Ok(_) => log::debug!("[iface] 'ip' reported no interfaces, trying crate fallback"),
            Err(err) => log::debug!("[iface] 'ip' command unavailable ({}), using crate", err),
        }
    }
    list_interfaces_crate()
}

/// Linux: parse `ip -4 addr show`. Sample line:
/// `    inet 192.168.1.22/24 brd 192.168.1.255 scope global eth0`
#[cfg(target_os = "linux")]
fn list_interfaces_ip_command() -> io::Result<Vec<NetInterface>> {
    use std::process::Command;

    let output = Command::new("ip").args(["-4", "addr", "show"]).output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut interfaces = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        let Some(inet_part) = line.strip_prefix("inet ") else {
            continue;
        };
        let mut tokens = inet_part.split_whitespace();
        let Some(cidr) = tokens.next() else { continue };
        let Some((addr_str, prefix_str)) = cidr.split_once('/') else {
            continue;
        };
        let (Ok(addr), Ok(prefix)) = (addr_str.parse::<Ipv4Addr>(), prefix_str.parse::<u8>())
        else {
            continue;
        };
        // The interface label is the last token of the inet line.
        let name = inet_part.split_whitespace().last().map(str::to_string);

        interfaces.push(NetInterface {
            name,
            addr,
            prefix_len: Some(prefix),
        });
    }

    Ok(interfaces)
}

/// Portable fallback via the `local_ip_address` crate (no netmask).
fn list_interfaces_crate() -> io::Result<Vec<NetInterface>> {
    let interfaces = local_ip_address::list_afinet_netifas()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let mut out = Vec::new();
    for (name, ip) in interfaces {
        if let std::net::IpAddr::V4(ipv4) = ip {
            out.push(NetInterface {
                name: Some(name),
                addr: ipv4,
                prefix_len: None,
            });
        }
    }
    log::debug!("[iface] crate fallback found {} IPv4 interfaces", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_address_formula() {
        assert_eq!(
            broadcast_address(Ipv4Addr::new(192, 168, 1, 22), 24),
            Ipv4Addr::new(192, 168, 1, 255)
        );
        assert_eq!(
            broadcast_address(Ipv4Addr::new(10, 4, 17, 9), 8),
            Ipv4Addr::new(10, 255, 255, 255)
        );
        assert_eq!(
            broadcast_address(Ipv4Addr::new(172, 16, 5, 3), 20),
            Ipv4Addr::new(172, 16, 15, 255)
        );
    }

    #[test]
    fn test_broadcast_address_edge_prefixes() {
        assert_eq!(
            broadcast_address(Ipv4Addr::new(1, 2, 3, 4), 0),
            Ipv4Addr::BROADCAST
        );
        assert_eq!(
            broadcast_address(Ipv4Addr::new(1, 2, 3, 4), 32),
            Ipv4Addr::new(1, 2, 3, 4)
        );
    }

    #[test]
    fn test_interface_without_netmask_uses_limited_broadcast() {
        let iface = NetInterface {
            name: None,
            addr: Ipv4Addr::new(192, 168, 0, 2),
            prefix_len: None,
        };
        assert_eq!(iface.broadcast(), Ipv4Addr::BROADCAST);
    }

    #[test]
    fn test_resolve_unknown_interface_is_error() {
        let err = resolve_interface(Some("definitely-not-a-nic0"))
            .expect_err("unknown interface must not resolve");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
