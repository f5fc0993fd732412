// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Periodic OptIn keep-alive thread.
//!
//! Nodes that stop announcing get evicted by their peers, so the announcer
//! broadcasts an OptIn every `interval` (1 s by default) from the moment the
//! session connects until shutdown.

use crate::discovery::{LocalNode, PeerRegistry};
use crate::engine::SessionFault;
use crate::transport::UdpTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Keep-alive announcer running in a background thread.
///
/// Dropping (or calling `shutdown`) signals the thread and joins it.
pub struct OptInAnnouncer {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl OptInAnnouncer {
    /// Spawn the announcer thread.
    #[must_use]
    pub fn spawn(
        node: Arc<LocalNode>,
        transport: Arc<UdpTransport>,
        registry: PeerRegistry,
        interval: Duration,
        fault: SessionFault,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("tcnet-announcer".to_string())
            .spawn(move || {
                announcer_loop(node, transport, registry, interval, fault, shutdown_clone);
            })
            .expect("spawn announcer thread");

        Self {
            handle: Some(handle),
            shutdown,
        }
    }

    /// Signal the thread to stop and wait for completion.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OptInAnnouncer {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn announcer_loop(
    node: Arc<LocalNode>,
    transport: Arc<UdpTransport>,
    registry: PeerRegistry,
    interval: Duration,
    fault: SessionFault,
    shutdown: Arc<AtomicBool>,
) {
    log::debug!(
        "[announcer] started, node_id={} interval={:?}",
        node.node_id,
        interval
    );

    while !shutdown.load(Ordering::Relaxed) {
        // Ourselves plus every peer we currently see.
        let node_count = (registry.len() as u16).saturating_add(1);
        let packet = node.opt_in(node_count);

        match packet.encode() {
            Ok(bytes) => {
                if let Err(err) = transport.send_broadcast(&bytes) {
                    log::error!("[announcer] OptIn send failed: {}", err);
                    fault.set(format!("OptIn broadcast failed: {}", err));
                    break;
                }
            }
            Err(err) => {
                // Only reachable with an invalid advertised name; config
                // validation rejects those before connect.
                log::error!("[announcer] OptIn encode failed: {}", err);
                break;
            }
        }

        // Sleep in small chunks so shutdown stays responsive.
        let sleep_end = std::time::Instant::now() + interval;
        while std::time::Instant::now() < sleep_end {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            thread::sleep(Duration::from_millis(50).min(interval));
        }
    }

    log::debug!("[announcer] stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::NetInterface;
    use std::net::Ipv4Addr;

    #[test]
    fn test_announcer_sends_opt_in_and_stops() {
        let iface = NetInterface {
            name: Some("lo".to_string()),
            addr: Ipv4Addr::LOCALHOST,
            prefix_len: Some(8),
        };
        let transport = Arc::new(UdpTransport::bind(&iface, 50620).expect("bind transport"));
        // The transport's own broadcast receiver sees the loopback broadcast.
        let listener = transport.broadcast_socket();
        listener
            .set_read_timeout(Some(Duration::from_millis(900)))
            .expect("set timeout");

        let node = Arc::new(LocalNode::new(
            "ANNC".into(),
            "Test".into(),
            "Sim".into(),
            transport.listener_port(),
        ));
        let announcer = OptInAnnouncer::spawn(
            node,
            transport,
            PeerRegistry::new(),
            Duration::from_millis(100),
            SessionFault::new(),
        );

        let mut buf = [0u8; 128];
        let (len, _) = listener.recv_from(&mut buf).expect("receive OptIn");
        let packet = crate::protocol::decode_packet(&buf[..len]).expect("decode OptIn");
        match packet {
            crate::protocol::Packet::OptIn(p) => assert_eq!(p.header.node_name, "ANNC"),
            other => panic!("expected OptIn, got {:?}", other),
        }

        announcer.shutdown();
    }
}
