// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request/response correlation.
//!
//! A request over UDP is just a datagram; this table is what turns the reply
//! into a typed completion. Pending requests are keyed by
//! `(peer node id, data type, layer)` — at most one on-wire request exists
//! per key, and overlapping callers coalesce onto the same entry, all
//! completing with one clone of the same result.
//!
//! Waveform replies arrive as fragments; the entry accumulates them (in any
//! order) and completes once every `packet_number` in `0..total_packets` is
//! present. A fragment that never arrives leaves the entry to die by the
//! caller's deadline.
//!
//! Each waiter carries a one-shot sender; the guard returned at registration
//! removes the waiter again if its future is dropped, so a cancelled caller
//! can never receive a late completion.

use crate::error::Error;
use crate::protocol::data::{
    CueData, DataPayload, LayerMetrics, MixerData, TrackMetadata, WaveformData, WaveformFragment,
};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Correlation key: one outstanding request per tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingKey {
    pub node_id: u16,
    pub data_type: u8,
    pub layer: u8,
}

/// A completed request payload, typed by what was asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyData {
    Metrics(LayerMetrics),
    Metadata(TrackMetadata),
    Cue(CueData),
    Mixer(MixerData),
    /// Fully reassembled waveform.
    Waveform(WaveformData),
}

/// Result delivered to every waiter of a pending entry.
pub type ReplyResult = Result<ReplyData, Error>;

struct Waiter {
    id: u64,
    tx: oneshot::Sender<ReplyResult>,
}

/// Out-of-order waveform fragment reassembly for one pending entry.
struct WaveformAssembly {
    total_packets: u32,
    fragments: HashMap<u32, WaveformFragment>,
}

impl WaveformAssembly {
    fn new(total_packets: u32) -> Self {
        Self {
            total_packets,
            fragments: HashMap::new(),
        }
    }

    /// Insert a fragment; returns the assembled waveform when complete.
    fn insert(&mut self, fragment: WaveformFragment) -> Option<WaveformData> {
        if fragment.total_packets != self.total_packets {
            log::debug!(
                "[pending] fragment declares {} total packets, first declared {}",
                fragment.total_packets,
                self.total_packets
            );
            self.total_packets = fragment.total_packets;
        }
        self.fragments.insert(fragment.packet_number, fragment);

        if (0..self.total_packets).all(|n| self.fragments.contains_key(&n)) {
            let first = &self.fragments[&0];
            let (layer, size) = (first.layer, first.size);
            let mut samples = Vec::new();
            for n in 0..self.total_packets {
                samples.extend_from_slice(&self.fragments[&n].samples);
            }
            Some(WaveformData {
                layer,
                size,
                samples,
            })
        } else {
            None
        }
    }
}

struct PendingEntry {
    waiters: Vec<Waiter>,
    assembly: Option<WaveformAssembly>,
}

/// Table of in-flight requests, shared by the request API and the unicast
/// receive loop.
pub struct PendingTable {
    entries: DashMap<PendingKey, PendingEntry>,
    next_waiter_id: AtomicU64,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_waiter_id: AtomicU64::new(1),
        }
    }

    /// Join (or create) the pending entry for `key`.
    ///
    /// Returns the waiter's receiver, a guard that deregisters the waiter on
    /// drop, and whether this waiter is the first — only the first caller
    /// puts a request on the wire.
    pub fn register(
        self: &Arc<Self>,
        key: PendingKey,
    ) -> (oneshot::Receiver<ReplyResult>, PendingGuard, bool) {
        let (tx, rx) = oneshot::channel();
        let id = self.next_waiter_id.fetch_add(1, Ordering::Relaxed);

        let mut first = false;
        {
            let mut entry = self.entries.entry(key).or_insert_with(|| {
                first = true;
                PendingEntry {
                    waiters: Vec::new(),
                    assembly: None,
                }
            });
            entry.waiters.push(Waiter { id, tx });
        }

        let guard = PendingGuard {
            table: Arc::clone(self),
            key,
            waiter_id: id,
            armed: true,
        };
        (rx, guard, first)
    }

    /// Complete (and remove) the entry for `key`, fanning the result out to
    /// every coalesced waiter. Returns false when no entry matched.
    pub fn complete(&self, key: PendingKey, result: ReplyResult) -> bool {
        match self.entries.remove(&key) {
            Some((_, entry)) => {
                for waiter in entry.waiters {
                    // Receiver may have been dropped (cancelled); fine.
                    let _ = waiter.tx.send(result.clone());
                }
                true
            }
            None => false,
        }
    }

    /// Route a decoded Data payload at the entry for `key`.
    ///
    /// Non-waveform payloads complete the entry immediately; waveform
    /// fragments accumulate until reassembly finishes. Returns false when
    /// no entry matched (caller forwards the packet to the event stream
    /// only).
    pub fn on_payload(&self, key: PendingKey, payload: DataPayload) -> bool {
        match payload {
            DataPayload::Metrics(m) => self.complete(key, Ok(ReplyData::Metrics(m))),
            DataPayload::Metadata(m) => self.complete(key, Ok(ReplyData::Metadata(m))),
            DataPayload::Cue(c) => self.complete(key, Ok(ReplyData::Cue(c))),
            DataPayload::Mixer(m) => self.complete(key, Ok(ReplyData::Mixer(m))),
            DataPayload::Waveform(fragment) => {
                let assembled = match self.entries.get_mut(&key) {
                    Some(mut entry) => {
                        let assembly = entry
                            .assembly
                            .get_or_insert_with(|| WaveformAssembly::new(fragment.total_packets));
                        assembly.insert(fragment)
                    }
                    None => return false,
                };
                if let Some(waveform) = assembled {
                    self.complete(key, Ok(ReplyData::Waveform(waveform)));
                }
                true
            }
        }
    }

    /// Fail every entry addressed at `node_id` (peer opted out or was
    /// evicted).
    pub fn fail_peer(&self, node_id: u16, error: Error) {
        let keys: Vec<PendingKey> = self
            .entries
            .iter()
            .map(|e| *e.key())
            .filter(|k| k.node_id == node_id)
            .collect();
        for key in keys {
            self.complete(key, Err(error.clone()));
        }
    }

    /// Fail every entry (disconnect or fatal session error).
    pub fn fail_all(&self, error: Error) {
        let keys: Vec<PendingKey> = self.entries.iter().map(|e| *e.key()).collect();
        for key in keys {
            self.complete(key, Err(error.clone()));
        }
    }

    /// Whether a request is outstanding for `key`.
    pub fn contains(&self, key: PendingKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_waiter(&self, key: PendingKey, waiter_id: u64) {
        let empty = match self.entries.get_mut(&key) {
            Some(mut entry) => {
                entry.waiters.retain(|w| w.id != waiter_id);
                entry.waiters.is_empty()
            }
            None => false,
        };
        // Last waiter gone: drop the whole entry so a late reply is treated
        // as unsolicited.
        if empty {
            self.entries.remove_if(&key, |_, entry| entry.waiters.is_empty());
        }
    }
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters a waiter when the caller stops waiting.
pub struct PendingGuard {
    table: Arc<PendingTable>,
    key: PendingKey,
    waiter_id: u64,
    armed: bool,
}

impl PendingGuard {
    /// The waiter received its completion; nothing left to clean up.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed {
            self.table.remove_waiter(self.key, self.waiter_id);
        }
    }
}
