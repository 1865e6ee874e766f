// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multicast group membership and interface discovery.

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Join `group` and configure loopback and TTL.
///
/// With an explicit `interface` the group is joined on that interface only.
/// With `UNSPECIFIED` it is joined on every non-loopback IPv4 interface, falling
/// back to the kernel's choice when none is found. Returns the interface used
/// for outgoing multicast.
pub fn join_multicast_group(
    socket: &UdpSocket,
    group: Ipv4Addr,
    interface: Ipv4Addr,
    ttl: u32,
    loopback: bool,
) -> io::Result<Ipv4Addr> {
    let outgoing = if interface.is_unspecified() {
        let interfaces = multicast_interfaces();
        if interfaces.is_empty() {
            log::debug!("[UDP] no suitable interface found for multicast, using UNSPECIFIED");
            socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
            Ipv4Addr::UNSPECIFIED
        } else {
            let mut joined = 0usize;
            for iface in &interfaces {
                match socket.join_multicast_v4(&group, iface) {
                    Ok(()) => {
                        joined += 1;
                        log::debug!("[UDP] join_multicast_v4({}) on interface {}", group, iface);
                    }
                    Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                        // already joined through the same physical NIC
                        joined += 1;
                        log::debug!(
                            "[UDP] join_multicast_v4({}) on {} - already joined, skipping",
                            group,
                            iface
                        );
                    }
                    Err(e) => {
                        log::debug!(
                            "[UDP] join_multicast_v4({}) on {} failed (non-fatal): {}",
                            group,
                            iface,
                            e
                        );
                    }
                }
            }
            if joined == 0 {
                socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
                Ipv4Addr::UNSPECIFIED
            } else {
                interfaces[0]
            }
        }
    } else {
        socket.join_multicast_v4(&group, &interface)?;
        log::debug!("[UDP] join_multicast_v4({}) on interface {}", group, interface);
        interface
    };

    socket.set_multicast_loop_v4(loopback)?;
    socket.set_multicast_ttl_v4(ttl)?;
    log::debug!("[UDP] multicast loop={} ttl={}", loopback, ttl);

    Ok(outgoing)
}

/// Non-loopback IPv4 interfaces, through the `local_ip_address` crate.
pub fn multicast_interfaces() -> Vec<Ipv4Addr> {
    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(ifs) => ifs,
        Err(e) => {
            log::debug!("[UDP] failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    let mut addrs = Vec::new();
    for (name, ip) in interfaces {
        if let IpAddr::V4(v4) = ip {
            if !v4.is_loopback() && !addrs.contains(&v4) {
                log::trace!("[UDP] candidate interface {} ({})", v4, name);
                addrs.push(v4);
            }
        }
    }
    addrs
}

/// Address of the primary IPv4 interface, used as the advertised service address
/// when none is configured.
pub fn primary_interface_ip() -> Option<Ipv4Addr> {
    match local_ip_address::local_ip() {
        Ok(IpAddr::V4(v4)) => Some(v4),
        Ok(IpAddr::V6(_)) => multicast_interfaces().first().copied(),
        Err(e) => {
            log::debug!("[UDP] primary interface lookup failed: {}", e);
            multicast_interfaces().first().copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interfaces_exclude_loopback() {
        assert!(multicast_interfaces().iter().all(|ip| !ip.is_loopback()));
    }
}
