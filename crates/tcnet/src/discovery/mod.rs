// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peer discovery state: the registry of live peers and our own identity.
//!
//! Peers announce themselves with broadcast OptIn frames and are keyed by
//! node id. Any packet from a known peer refreshes its `last_seen`; an OptOut
//! removes it immediately; the reaper evicts peers that stay silent past the
//! idle threshold.
//!
//! The registry invariant: the unicast destination for any request to node N
//! is `(source IP, advertised listener port)` from N's most recent OptIn.

pub mod announcer;
pub mod reaper;

use crate::protocol::{ManagementHeader, NodeType, OptInPacket, OptOutPacket, RequestPacket};
use crate::protocol::constants::{MessageType, PROTOCOL_VERSION_MAJOR, PROTOCOL_VERSION_MINOR};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A peer discovered on the segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerInfo {
    pub node_id: u16,
    pub node_name: String,
    pub node_type: NodeType,
    pub vendor_name: String,
    pub app_name: String,
    /// Unicast port the peer accepts requests on.
    pub listener_port: u16,
    /// Source address of the peer's most recent OptIn.
    pub remote_ip: IpAddr,
    pub uptime: u16,
    /// Last time any packet arrived from this peer.
    pub last_seen: Instant,
}

impl PeerInfo {
    /// Unicast destination for requests to this peer.
    pub fn endpoint(&self) -> SocketAddr {
        SocketAddr::new(self.remote_ip, self.listener_port)
    }

    /// Whether the peer has been silent past `idle`.
    pub fn is_idle(&self, idle: Duration) -> bool {
        self.last_seen.elapsed() > idle
    }

    /// Reset the idle clock; called on every packet from the peer.
    pub fn refresh(&mut self) {
        self.last_seen = Instant::now();
    }
}

type PeerDb = HashMap<u16, PeerInfo>;

/// Shared registry of live peers.
///
/// Cheap to clone; all clones share one table. Readers are the request path
/// and the facade, writers are the two receive loops and the reaper.
#[derive(Clone)]
pub struct PeerRegistry {
    db: Arc<RwLock<PeerDb>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self {
            db: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create or update a peer from an OptIn. Returns the stored record and
    /// whether it was newly added.
    pub fn upsert_opt_in(&self, packet: &OptInPacket, source_ip: IpAddr) -> (PeerInfo, bool) {
        let info = PeerInfo {
            node_id: packet.header.node_id,
            node_name: packet.header.node_name.clone(),
            node_type: NodeType::from_raw(packet.header.node_type),
            vendor_name: packet.vendor_name.clone(),
            app_name: packet.app_name.clone(),
            listener_port: packet.listener_port,
            remote_ip: source_ip,
            uptime: packet.uptime,
            last_seen: Instant::now(),
        };

        let mut db = recover_write(&self.db, "PeerRegistry::upsert_opt_in");
        let is_new = db.insert(info.node_id, info.clone()).is_none();
        if is_new {
            log::info!(
                "[discovery] peer {} '{}' joined ({}:{}, {})",
                info.node_id,
                info.node_name,
                info.remote_ip,
                info.listener_port,
                info.vendor_name
            );
        }
        (info, is_new)
    }

    /// Remove a peer (OptOut or eviction). Returns the removed record.
    pub fn remove(&self, node_id: u16) -> Option<PeerInfo> {
        let removed = recover_write(&self.db, "PeerRegistry::remove").remove(&node_id);
        if let Some(info) = &removed {
            log::info!("[discovery] peer {} '{}' left", info.node_id, info.node_name);
        }
        removed
    }

    /// Refresh `last_seen` for a peer; true if the peer is known.
    pub fn touch(&self, node_id: u16) -> bool {
        let mut db = recover_write(&self.db, "PeerRegistry::touch");
        match db.get_mut(&node_id) {
            Some(info) => {
                info.refresh();
                true
            }
            None => false,
        }
    }

    /// Look up a peer by node id.
    pub fn get(&self, node_id: u16) -> Option<PeerInfo> {
        recover_read(&self.db, "PeerRegistry::get").get(&node_id).cloned()
    }

    /// Default request target: the lowest-id Master, else the lowest-id peer.
    pub fn default_peer(&self) -> Option<PeerInfo> {
        let db = recover_read(&self.db, "PeerRegistry::default_peer");
        db.values()
            .filter(|p| p.node_type == NodeType::Master)
            .min_by_key(|p| p.node_id)
            .or_else(|| db.values().min_by_key(|p| p.node_id))
            .cloned()
    }

    /// Remove and return every peer idle past `idle`.
    pub fn evict_idle(&self, idle: Duration) -> Vec<PeerInfo> {
        let mut db = recover_write(&self.db, "PeerRegistry::evict_idle");
        let expired: Vec<u16> = db
            .iter()
            .filter(|(_, info)| info.is_idle(idle))
            .map(|(id, _)| *id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| db.remove(&id))
            .collect()
    }

    /// Copy of the current peer table.
    pub fn snapshot(&self) -> Vec<PeerInfo> {
        let mut peers: Vec<PeerInfo> =
            recover_read(&self.db, "PeerRegistry::snapshot").values().cloned().collect();
        peers.sort_by_key(|p| p.node_id);
        peers
    }

    pub fn len(&self) -> usize {
        recover_read(&self.db, "PeerRegistry::len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Macro to generate poisoned lock recovery functions (eliminates duplication)
macro_rules! impl_recover_lock {
    ($fn_name:ident, $lock_method:ident, $guard_type:ty) => {
        fn $fn_name<'a, T>(lock: &'a RwLock<T>, context: &str) -> $guard_type {
            match lock.$lock_method() {
                Ok(guard) => guard,
                Err(poisoned) => {
                    log::debug!("[discovery] WARNING: {} poisoned, recovering", context);
                    poisoned.into_inner()
                }
            }
        }
    };
}

impl_recover_lock!(recover_read, read, RwLockReadGuard<'a, T>);
impl_recover_lock!(recover_write, write, RwLockWriteGuard<'a, T>);

// ============================================================================
// Local node identity
// ============================================================================

/// Our own identity on the segment: header fields for every outbound packet.
pub struct LocalNode {
    pub node_id: u16,
    pub node_name: String,
    pub vendor_name: String,
    pub app_name: String,
    /// Advertised unicast port (the transport's unicast socket).
    pub listener_port: u16,
    sequence: AtomicU8,
    started: Instant,
}

impl LocalNode {
    pub fn new(
        node_name: String,
        vendor_name: String,
        app_name: String,
        listener_port: u16,
    ) -> Self {
        Self {
            node_id: generate_node_id(),
            node_name,
            vendor_name,
            app_name,
            listener_port,
            sequence: AtomicU8::new(0),
            started: Instant::now(),
        }
    }

    /// Fresh management header for an outbound packet, with the next
    /// sequence number and a timestamp relative to client start.
    pub fn header(&self, message_type: MessageType) -> ManagementHeader {
        ManagementHeader {
            node_id: self.node_id,
            version_major: PROTOCOL_VERSION_MAJOR,
            version_minor: PROTOCOL_VERSION_MINOR,
            message_type: message_type.raw(),
            node_name: self.node_name.clone(),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            node_type: NodeType::Slave.raw(),
            node_options: 0,
            timestamp: self.started.elapsed().as_millis() as u32,
        }
    }

    /// Build an OptIn announcing this node.
    pub fn opt_in(&self, node_count: u16) -> OptInPacket {
        OptInPacket {
            header: self.header(MessageType::OptIn),
            node_count,
            listener_port: self.listener_port,
            uptime: self.started.elapsed().as_secs().min(u64::from(u16::MAX)) as u16,
            vendor_name: self.vendor_name.clone(),
            app_name: self.app_name.clone(),
            version_major: 0,
            version_minor: 3,
            version_bugfix: 0,
        }
    }

    /// Build the departing OptOut.
    pub fn opt_out(&self, node_count: u16) -> OptOutPacket {
        OptOutPacket {
            header: self.header(MessageType::OptOut),
            node_count,
            listener_port: self.listener_port,
        }
    }

    /// Build a data request.
    pub fn request(&self, data_type: u8, layer: u8) -> RequestPacket {
        RequestPacket {
            header: self.header(MessageType::Request),
            data_type,
            layer,
        }
    }
}

/// Node id from the wall clock and the process id; u16, never zero.
fn generate_node_id() -> u16 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mixed = (now.as_nanos() as u32) ^ std::process::id();
    let id = (mixed & 0xFFFF) as u16;
    if id == 0 {
        1
    } else {
        id
    }
}

/// Test fixtures shared by discovery and engine tests.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    pub fn opt_in_as(node_id: u16, node_type: NodeType, listener_port: u16) -> OptInPacket {
        OptInPacket {
            header: ManagementHeader {
                node_id,
                version_major: PROTOCOL_VERSION_MAJOR,
                version_minor: 0,
                message_type: MessageType::OptIn.raw(),
                node_name: format!("N{}", node_id),
                sequence: 0,
                node_type: node_type.raw(),
                node_options: 0,
                timestamp: 0,
            },
            node_count: 1,
            listener_port,
            uptime: 0,
            vendor_name: "Test".to_string(),
            app_name: "Sim".to_string(),
            version_major: 0,
            version_minor: 0,
            version_bugfix: 0,
        }
    }

    pub fn opt_in_from(node_id: u16, listener_port: u16) -> OptInPacket {
        opt_in_as(node_id, NodeType::Master, listener_port)
    }
}
