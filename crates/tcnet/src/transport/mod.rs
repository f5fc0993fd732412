// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! UDP transport: the three sockets a TCNet session runs on.
//!
//! - **Broadcast receive**: bound to the wildcard address on the well-known
//!   discovery port; sees every node's OptIn/OptOut/Status/Time traffic.
//! - **Broadcast send**: bound to the selected interface on an ephemeral
//!   port; carries our OptIn keep-alives and the final OptOut.
//! - **Unicast**: bound to the selected interface on an ephemeral port. Its
//!   local port is what we advertise as `listener_port`; replies to requests
//!   and peer-targeted management traffic arrive here.

pub mod interface;

pub use interface::{broadcast_address, resolve_interface, NetInterface};

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

/// The three UDP endpoints of a session.
///
/// Sockets are shared (`Arc`) between the receive loops, the keep-alive
/// announcer and the request path.
pub struct UdpTransport {
    /// Wildcard-bound receiver on the discovery port.
    broadcast_rx: Arc<UdpSocket>,
    /// Interface-bound sender for OptIn/OptOut.
    broadcast_tx: Arc<UdpSocket>,
    /// Interface-bound request/reply socket (its port is advertised).
    unicast: Arc<UdpSocket>,
    /// Directed broadcast destination, `<segment broadcast>:<port>`.
    broadcast_dest: SocketAddr,
    /// Local interface the outbound sockets are bound to.
    iface_addr: Ipv4Addr,
    /// Local port of the unicast socket.
    listener_port: u16,
}

impl UdpTransport {
    /// Bind all three sockets on `iface`, receiving broadcasts on `port`.
    pub fn bind(iface: &NetInterface, port: u16) -> io::Result<Self> {
        let broadcast_rx = bind_broadcast_receiver(port)?;
        log::debug!("[udp] broadcast receiver bound to 0.0.0.0:{}", port);

        let broadcast_tx = bind_ephemeral(iface.addr, true)?;
        let unicast = bind_ephemeral(iface.addr, false)?;
        let listener_port = unicast.local_addr()?.port();

        let broadcast_dest = SocketAddr::new(IpAddr::V4(iface.broadcast()), port);
        log::debug!(
            "[udp] broadcast dest={} unicast listener port={} iface={}",
            broadcast_dest,
            listener_port,
            iface.addr
        );

        Ok(Self {
            broadcast_rx: Arc::new(broadcast_rx),
            broadcast_tx: Arc::new(broadcast_tx),
            unicast: Arc::new(unicast),
            broadcast_dest,
            iface_addr: iface.addr,
            listener_port,
        })
    }

    /// Send a datagram to the segment broadcast address.
    pub fn send_broadcast(&self, data: &[u8]) -> io::Result<usize> {
        let sent = self.broadcast_tx.send_to(data, self.broadcast_dest)?;
        log::debug!(
            "[udp] broadcast send len={} -> {}",
            sent,
            self.broadcast_dest
        );
        Ok(sent)
    }

    /// Send a datagram to a peer's unicast endpoint from the listener socket.
    ///
    /// Replies come back to this socket, which is why requests must not go
    /// out through the broadcast sender.
    pub fn send_to(&self, data: &[u8], endpoint: SocketAddr) -> io::Result<usize> {
        let sent = self.unicast.send_to(data, endpoint)?;
        log::debug!("[udp] unicast send len={} -> {}", sent, endpoint);
        Ok(sent)
    }

    /// Shared handle on the broadcast receive socket.
    #[must_use]
    pub fn broadcast_socket(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.broadcast_rx)
    }

    /// Shared handle on the unicast socket.
    #[must_use]
    pub fn unicast_socket(&self) -> Arc<UdpSocket> {
        Arc::clone(&self.unicast)
    }

    /// Local port of the unicast socket; advertised in OptIn frames.
    #[must_use]
    pub fn listener_port(&self) -> u16 {
        self.listener_port
    }

    /// Local unicast endpoint (useful for loopback tests).
    pub fn unicast_addr(&self) -> io::Result<SocketAddr> {
        self.unicast.local_addr()
    }

    /// Directed broadcast destination.
    #[must_use]
    pub fn broadcast_dest(&self) -> SocketAddr {
        self.broadcast_dest
    }

    /// Interface address the outbound sockets are bound to.
    #[must_use]
    pub fn iface_addr(&self) -> Ipv4Addr {
        self.iface_addr
    }
}

/// Wildcard-bound, address-reusable receiver for the discovery port.
///
/// `SO_REUSEADDR` lets several TCNet processes coexist on one host, which is
/// also what the hardware expects of the shared discovery port.
fn bind_broadcast_receiver(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    socket.bind(&bind_addr.into())?;
    Ok(socket.into())
}

/// Interface-bound socket on an OS-assigned port.
fn bind_ephemeral(iface_addr: Ipv4Addr, broadcast: bool) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    if broadcast {
        socket.set_broadcast(true)?;
    }
    let bind_addr = SocketAddr::new(IpAddr::V4(iface_addr), 0);
    socket.bind(&bind_addr.into())?;
    Ok(socket.into())
}
