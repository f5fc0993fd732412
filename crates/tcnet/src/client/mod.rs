// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client facade: session lifecycle and typed data queries.
//!
//! `connect` binds the three session sockets, starts the background tasks
//! (two receive loops, the OptIn announcer, the idle-peer reaper), sends the
//! first OptIn and waits briefly for a peer to show up. From there the typed
//! query methods pick a default peer (the first Master, falling back to any
//! peer) and run a correlated request against it.
//!
//! `disconnect` stops every task, broadcasts an OptOut, fails outstanding
//! requests with `Shutdown` and closes the event stream. Dropping a
//! connected client does the same.

#[cfg(test)]
mod tests;

use crate::config::ClientConfig;
use crate::discovery::announcer::OptInAnnouncer;
use crate::discovery::reaper::PeerReaper;
use crate::discovery::{LocalNode, PeerInfo, PeerRegistry};
use crate::engine::hub::{Event, EventHub};
use crate::engine::pending::{PendingKey, PendingTable, ReplyData};
use crate::engine::{Dispatcher, ListenerRole, SessionFault, SocketListener};
use crate::error::{Error, Result};
use crate::protocol::constants::{BROADCAST_PORT, DataType};
use crate::protocol::data::{CueData, LayerMetrics, MixerData, TrackMetadata, WaveformData, WaveformSize};
use crate::transport::{resolve_interface, NetInterface, UdpTransport};
use crossbeam::channel::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Mixer requests address the mixer itself rather than a playback layer.
const MIXER_LAYER: u8 = 0;

/// How often `connect` polls the registry during the discovery grace period.
const GRACE_POLL: Duration = Duration::from_millis(20);

/// A connected TCNet session.
pub struct Client {
    config: ClientConfig,
    node: Arc<LocalNode>,
    transport: Arc<UdpTransport>,
    registry: PeerRegistry,
    pending: Arc<PendingTable>,
    hub: Arc<EventHub>,
    fault: SessionFault,
    listeners: Vec<SocketListener>,
    announcer: Option<OptInAnnouncer>,
    reaper: Option<PeerReaper>,
    disconnected: bool,
}

impl Client {
    /// Connect on the configured (or primary) interface and the well-known
    /// broadcast port.
    ///
    /// Resolves once the first OptIn went out and a peer has been seen, or
    /// after the discovery grace period on a quiet segment.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let iface = resolve_interface(config.broadcast_interface.as_deref())
            .map_err(|e| Error::InvalidInterface(e.to_string()))?;
        Self::connect_on(config, iface, BROADCAST_PORT)
    }

    /// Connect on an explicit interface and broadcast port.
    ///
    /// For non-standard segments and loopback test setups; `connect` is the
    /// normal entry point.
    pub fn connect_on(
        config: ClientConfig,
        iface: NetInterface,
        broadcast_port: u16,
    ) -> Result<Self> {
        config.validate().map_err(Error::Config)?;

        let transport = Arc::new(
            UdpTransport::bind(&iface, broadcast_port).map_err(|e| Error::Bind(e.to_string()))?,
        );
        let node = Arc::new(LocalNode::new(
            config.node_name.clone(),
            config.vendor_name.clone(),
            config.app_name.clone(),
            transport.listener_port(),
        ));
        log::info!(
            "[client] node {} '{}' on {} (listener port {})",
            node.node_id,
            node.node_name,
            iface.addr,
            node.listener_port
        );

        let registry = PeerRegistry::new();
        let pending = Arc::new(PendingTable::new());
        let hub = Arc::new(EventHub::new(config.event_buffer));
        let fault = SessionFault::new();

        let dispatcher = Dispatcher {
            local_node_id: node.node_id,
            registry: registry.clone(),
            pending: Arc::clone(&pending),
            hub: Arc::clone(&hub),
        };

        let listeners = vec![
            SocketListener::spawn(
                ListenerRole::Broadcast,
                transport.broadcast_socket(),
                dispatcher.clone(),
                fault.clone(),
            )
            .map_err(|e| Error::Bind(e.to_string()))?,
            SocketListener::spawn(
                ListenerRole::Unicast,
                transport.unicast_socket(),
                dispatcher,
                fault.clone(),
            )
            .map_err(|e| Error::Bind(e.to_string()))?,
        ];

        // First OptIn goes out synchronously so the segment learns about us
        // before connect returns.
        let opt_in = node
            .opt_in(1)
            .encode()
            .map_err(Error::Codec)?;
        transport
            .send_broadcast(&opt_in)
            .map_err(|e| Error::Send(e.to_string()))?;

        let announcer = OptInAnnouncer::spawn(
            Arc::clone(&node),
            Arc::clone(&transport),
            registry.clone(),
            config.opt_in_interval,
            fault.clone(),
        );
        let reaper = PeerReaper::spawn(
            registry.clone(),
            Arc::clone(&pending),
            Arc::clone(&hub),
            config.peer_idle_timeout(),
        );

        let client = Self {
            config,
            node,
            transport,
            registry,
            pending,
            hub,
            fault,
            listeners,
            announcer: Some(announcer),
            reaper: Some(reaper),
            disconnected: false,
        };
        client.await_first_peer();
        Ok(client)
    }

    /// Block until a peer appears or the discovery grace period elapses.
    fn await_first_peer(&self) {
        let deadline = Instant::now() + self.config.discovery_grace;
        while self.registry.is_empty() && Instant::now() < deadline {
            thread::sleep(GRACE_POLL);
        }
        if self.registry.is_empty() {
            log::info!(
                "[client] no peer within {:?}, continuing on quiet segment",
                self.config.discovery_grace
            );
        } else {
            log::debug!("[client] first peer seen, session ready");
        }
    }

    /// End the session: stop tasks, broadcast OptOut, fail pending requests.
    pub fn disconnect(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        if self.disconnected {
            return;
        }
        self.disconnected = true;
        log::info!("[client] disconnecting node {}", self.node.node_id);

        if let Some(announcer) = self.announcer.take() {
            announcer.shutdown();
        }
        if let Some(reaper) = self.reaper.take() {
            reaper.shutdown();
        }
        for listener in self.listeners.drain(..) {
            listener.shutdown();
        }

        // Best effort: the segment forgets us faster with an OptOut.
        match self.node.opt_out(1).encode() {
            Ok(bytes) => {
                if let Err(err) = self.transport.send_broadcast(&bytes) {
                    log::warn!("[client] OptOut send failed: {}", err);
                }
            }
            Err(err) => log::warn!("[client] OptOut encode failed: {}", err),
        }

        self.pending.fail_all(Error::Shutdown);
        self.hub.close();
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Subscribe to decoded packets and peer lifecycle events.
    ///
    /// Delivery is lossy: a subscriber that stops draining its channel loses
    /// events, never the receive loops.
    pub fn subscribe(&self) -> Receiver<Event> {
        self.hub.subscribe()
    }

    /// Current peer table, sorted by node id.
    pub fn peers(&self) -> Vec<PeerInfo> {
        self.registry.snapshot()
    }

    /// Our node id on the segment.
    #[must_use]
    pub fn node_id(&self) -> u16 {
        self.node.node_id
    }

    /// Local unicast port advertised to peers.
    #[must_use]
    pub fn listener_port(&self) -> u16 {
        self.transport.listener_port()
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Low-level request against the default peer.
    pub async fn request_data(&self, data_type: DataType, layer: u8) -> Result<ReplyData> {
        self.ensure_running()?;
        let peer = self.registry.default_peer().ok_or(Error::NoPeer)?;
        self.request_from(&peer, data_type, layer, self.config.request_timeout)
            .await
    }

    /// Low-level request against the default peer with an explicit deadline.
    pub async fn request_data_with_timeout(
        &self,
        data_type: DataType,
        layer: u8,
        deadline: Duration,
    ) -> Result<ReplyData> {
        self.ensure_running()?;
        let peer = self.registry.default_peer().ok_or(Error::NoPeer)?;
        self.request_from(&peer, data_type, layer, deadline).await
    }

    /// Track metadata (artist, title, key, id) for a layer.
    pub async fn track_info(&self, layer: u8) -> Result<TrackMetadata> {
        match self.request_data(DataType::Metadata, layer).await? {
            ReplyData::Metadata(meta) => Ok(meta),
            other => Err(unexpected_reply("metadata", &other)),
        }
    }

    /// Live playback metrics (bpm, position, state) for a layer.
    pub async fn layer_metrics(&self, layer: u8) -> Result<LayerMetrics> {
        match self.request_data(DataType::Metrics, layer).await? {
            ReplyData::Metrics(metrics) => Ok(metrics),
            other => Err(unexpected_reply("metrics", &other)),
        }
    }

    /// Cue table for a layer.
    pub async fn cue_data(&self, layer: u8) -> Result<CueData> {
        match self.request_data(DataType::Cue, layer).await? {
            ReplyData::Cue(cue) => Ok(cue),
            other => Err(unexpected_reply("cue data", &other)),
        }
    }

    /// Mixer state snapshot.
    pub async fn mixer_state(&self) -> Result<MixerData> {
        match self.request_data(DataType::Mixer, MIXER_LAYER).await? {
            ReplyData::Mixer(mixer) => Ok(mixer),
            other => Err(unexpected_reply("mixer state", &other)),
        }
    }

    /// Reassembled waveform for a layer.
    pub async fn waveform(&self, layer: u8, size: WaveformSize) -> Result<WaveformData> {
        match self.request_data(size.data_type(), layer).await? {
            ReplyData::Waveform(wave) => Ok(wave),
            other => Err(unexpected_reply("waveform", &other)),
        }
    }

    /// Register (or coalesce onto) a pending entry, put the request on the
    /// wire, and await completion or the deadline.
    async fn request_from(
        &self,
        peer: &PeerInfo,
        data_type: DataType,
        layer: u8,
        deadline: Duration,
    ) -> Result<ReplyData> {
        let key = PendingKey {
            node_id: peer.node_id,
            data_type: data_type.raw(),
            layer,
        };
        let (rx, guard, first) = self.pending.register(key);

        if first {
            let bytes = match self.node.request(key.data_type, layer).encode() {
                Ok(bytes) => bytes,
                Err(err) => {
                    let err = Error::Codec(err);
                    self.pending.complete(key, Err(err.clone()));
                    return Err(err);
                }
            };
            if let Err(io_err) = self.transport.send_to(&bytes, peer.endpoint()) {
                let err = Error::Send(io_err.to_string());
                // Fans out to every waiter that already coalesced, us included.
                self.pending.complete(key, Err(err.clone()));
                return Err(err);
            }
            log::debug!(
                "[client] request sent to peer {} (type {}, layer {})",
                peer.node_id,
                key.data_type,
                layer
            );
        }

        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(result)) => {
                guard.disarm();
                result
            }
            Ok(Err(_closed)) => {
                guard.disarm();
                Err(Error::Internal("completion channel closed".to_string()))
            }
            // Deadline: the guard drops here and deregisters the waiter, so
            // a late reply goes to the event stream instead of a dead slot.
            Err(_elapsed) => Err(Error::Timeout {
                node_id: peer.node_id,
                data_type: key.data_type,
                layer,
            }),
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.disconnected {
            return Err(Error::Shutdown);
        }
        if let Some(message) = self.fault.get() {
            return Err(Error::SessionFailed(message));
        }
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

fn unexpected_reply(wanted: &str, got: &ReplyData) -> Error {
    Error::Internal(format!("expected {} reply, got {:?}", wanted, got))
}
