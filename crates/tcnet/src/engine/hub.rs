// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event hub: fan-out of decoded packets and peer lifecycle events.
//!
//! Every subscriber gets its own bounded channel. Publishing is `try_send`
//! per subscriber: a slow consumer loses events rather than ever blocking a
//! receive loop. Disconnected subscribers are pruned on publish.

use crate::discovery::PeerInfo;
use crate::protocol::Packet;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use std::sync::Mutex;

/// Events delivered to subscribers.
#[derive(Debug, Clone)]
pub enum Event {
    /// A packet decoded off the broadcast receiver.
    Broadcast(Packet),
    /// A packet decoded off the unicast socket.
    Unicast(Packet),
    /// A peer appeared (first OptIn).
    PeerAdded(PeerInfo),
    /// A peer opted out or was evicted.
    PeerRemoved(PeerInfo),
}

/// Lossy broadcast hub.
pub struct EventHub {
    subscribers: Mutex<Vec<Sender<Event>>>,
    capacity: usize,
}

impl EventHub {
    /// Hub whose subscribers each buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a subscriber; returns its receiving end.
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = channel::bounded(self.capacity);
        match self.subscribers.lock() {
            Ok(mut subs) => subs.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }
        rx
    }

    /// Deliver `event` to every subscriber, dropping it where the buffer is
    /// full and forgetting subscribers whose receiver is gone.
    pub fn publish(&self, event: Event) {
        let mut subs = match self.subscribers.lock() {
            Ok(subs) => subs,
            Err(poisoned) => poisoned.into_inner(),
        };

        subs.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!("[hub] subscriber buffer full, event dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Drop every subscriber channel; receivers observe disconnection.
    pub fn close(&self) {
        match self.subscribers.lock() {
            Ok(mut subs) => subs.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        match self.subscribers.lock() {
            Ok(subs) => subs.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
