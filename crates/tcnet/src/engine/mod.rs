// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive engine: socket listener threads and inbound dispatch.
//!
//! Each session socket gets its own listener thread:
//!
//! ```text
//! recv_from() -> decode_packet() -> dispatch
//!                                     |- OptIn/OptOut  -> peer registry
//!                                     |- Error/Data    -> pending table
//!                                     '- every packet  -> event hub
//! ```
//!
//! Malformed datagrams are dropped with a diagnostic and the loop continues;
//! only a socket-level I/O failure is fatal, flipping the shared session
//! fault so later API calls fail with the same cause.

pub mod hub;
pub mod pending;

use crate::discovery::PeerRegistry;
use crate::error::Error;
use crate::protocol::constants::ERR_REQUEST_RESPONSE_OK;
use crate::protocol::{self, codec, DataType, DecodeError, ManagementHeader, Packet};
use hub::{Event, EventHub};
use pending::{PendingKey, PendingTable};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Largest defined packet (big waveform) with headroom.
const RECV_BUFFER_LEN: usize = 8192;

/// How long a blocking `recv_from` waits before rechecking the stop flag.
const RECV_POLL: Duration = Duration::from_millis(200);

/// First fatal I/O error of the session, shared across tasks.
///
/// Codec errors never set this; only socket failures do. Once set, it stays
/// set, and every subsequent API call reports it.
#[derive(Clone)]
pub struct SessionFault {
    inner: Arc<RwLock<Option<String>>>,
}

impl SessionFault {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    /// Record the first fault; later calls keep the original cause.
    pub fn set(&self, message: String) {
        let mut slot = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_none() {
            log::error!("[engine] session failed: {}", message);
            *slot = Some(message);
        }
    }

    pub fn get(&self) -> Option<String> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_faulted(&self) -> bool {
        self.get().is_some()
    }
}

impl Default for SessionFault {
    fn default() -> Self {
        Self::new()
    }
}

/// Which socket a listener serves; selects the event tag and the log prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerRole {
    Broadcast,
    Unicast,
}

impl ListenerRole {
    fn tag(self) -> &'static str {
        match self {
            Self::Broadcast => "bcast-rx",
            Self::Unicast => "ucast-rx",
        }
    }
}

/// Everything a listener thread needs to dispatch a datagram.
#[derive(Clone)]
pub struct Dispatcher {
    pub local_node_id: u16,
    pub registry: PeerRegistry,
    pub pending: Arc<PendingTable>,
    pub hub: Arc<EventHub>,
}

impl Dispatcher {
    /// Decode one datagram and route it. Never panics, never blocks.
    pub fn handle_datagram(&self, buf: &[u8], source: SocketAddr, role: ListenerRole) {
        let packet = match protocol::decode_packet(buf) {
            Ok(packet) => packet,
            Err(DecodeError::Unsupported {
                message_type,
                data_type,
            }) => {
                self.handle_unsupported(buf, message_type, data_type, source, role);
                return;
            }
            Err(DecodeError::Codec(err)) => {
                log::debug!(
                    "[{}] dropped malformed datagram from {}: {}",
                    role.tag(),
                    source,
                    err
                );
                return;
            }
        };

        let node_id = packet.header().node_id;
        if node_id == self.local_node_id {
            // Our own broadcast looped back.
            return;
        }

        // Any traffic from a known peer resets its idle clock.
        self.registry.touch(node_id);

        match &packet {
            Packet::OptIn(opt_in) => {
                let (info, is_new) = self.registry.upsert_opt_in(opt_in, source.ip());
                if is_new {
                    self.hub.publish(Event::PeerAdded(info));
                }
            }
            Packet::OptOut(_) => {
                if let Some(info) = self.registry.remove(node_id) {
                    self.pending
                        .fail_peer(node_id, Error::PeerGone { node_id });
                    self.hub.publish(Event::PeerRemoved(info));
                }
            }
            Packet::Error(err) if err.code != ERR_REQUEST_RESPONSE_OK => {
                let key = PendingKey {
                    node_id,
                    data_type: err.data_type,
                    layer: err.layer_id,
                };
                let completed = self.pending.complete(
                    key,
                    Err(Error::Remote {
                        node_id,
                        data_type: err.data_type,
                        layer: err.layer_id,
                        code: err.code,
                    }),
                );
                if !completed {
                    log::debug!(
                        "[{}] unsolicited error notification from {} (type {}, layer {}, code {})",
                        role.tag(),
                        node_id,
                        err.data_type,
                        err.layer_id,
                        err.code
                    );
                }
            }
            Packet::Data { payload, .. } => {
                let key = PendingKey {
                    node_id,
                    data_type: payload.data_type().raw(),
                    layer: payload.layer(),
                };
                let mut handled = self.pending.on_payload(key, payload.clone());
                // Mixer replies carry the mixer id where other payloads carry
                // the layer; requests address the mixer as layer 0.
                if !handled && payload.data_type() == DataType::Mixer {
                    handled = self
                        .pending
                        .on_payload(PendingKey { layer: 0, ..key }, payload.clone());
                }
                if !handled {
                    log::debug!(
                        "[{}] unsolicited data from {} (type {}, layer {})",
                        role.tag(),
                        node_id,
                        key.data_type,
                        key.layer
                    );
                }
            }
            _ => {}
        }

        // Telemetry consumers see every decoded packet, replies included.
        let event = match role {
            ListenerRole::Broadcast => Event::Broadcast(packet),
            ListenerRole::Unicast => Event::Unicast(packet),
        };
        self.hub.publish(event);
    }

    /// A recognized-but-undecodable frame (beat grid, unknown sub-type):
    /// fail any waiter, drop the frame, never disturb peer state.
    fn handle_unsupported(
        &self,
        buf: &[u8],
        message_type: u8,
        data_type: Option<u8>,
        source: SocketAddr,
        role: ListenerRole,
    ) {
        log::debug!(
            "[{}] unsupported packet from {} (message type {}, sub-type {:?})",
            role.tag(),
            source,
            message_type,
            data_type
        );

        let Some(data_type) = data_type else { return };
        // The header already validated, or decode would have failed Codec.
        let Ok(header) = ManagementHeader::decode(buf) else {
            return;
        };
        let layer = codec::read_u8(buf, 25).unwrap_or(0);
        self.pending.complete(
            PendingKey {
                node_id: header.node_id,
                data_type,
                layer,
            },
            Err(Error::Unsupported { data_type }),
        );
    }
}

/// A socket receive loop running in a background thread.
pub struct SocketListener {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl SocketListener {
    /// Spawn a listener on `socket`.
    pub fn spawn(
        role: ListenerRole,
        socket: Arc<UdpSocket>,
        dispatcher: Dispatcher,
        fault: SessionFault,
    ) -> io::Result<Self> {
        socket.set_read_timeout(Some(RECV_POLL))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name(format!("tcnet-{}", role.tag()))
            .spawn(move || {
                run_loop(role, socket, dispatcher, fault, shutdown_clone);
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
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

impl Drop for SocketListener {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run_loop(
    role: ListenerRole,
    socket: Arc<UdpSocket>,
    dispatcher: Dispatcher,
    fault: SessionFault,
    shutdown: Arc<AtomicBool>,
) {
    log::debug!("[{}] listener started", role.tag());
    let mut buf = vec![0u8; RECV_BUFFER_LEN];

    while !shutdown.load(Ordering::Relaxed) {
        match socket.recv_from(&mut buf) {
            Ok((len, source)) => {
                dispatcher.handle_datagram(&buf[..len], source, role);
            }
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut =>
            {
                // Read timeout: recheck the stop flag.
            }
            Err(err) => {
                fault.set(format!("{} receive failed: {}", role.tag(), err));
                dispatcher
                    .pending
                    .fail_all(Error::SessionFailed(err.to_string()));
                break;
            }
        }
    }

    log::debug!("[{}] listener stopped", role.tag());
}
