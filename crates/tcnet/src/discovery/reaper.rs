// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Idle-peer eviction thread.
//!
//! Background sweep over the peer registry: peers silent for longer than the
//! idle threshold are removed, their in-flight requests fail with `PeerGone`,
//! and a peer-removed event is published.

use crate::discovery::PeerRegistry;
use crate::engine::hub::{Event, EventHub};
use crate::engine::pending::PendingTable;
use crate::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SWEEP_INTERVAL: Duration = Duration::from_millis(250);

/// Eviction sweeper running in a background thread.
pub struct PeerReaper {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl PeerReaper {
    /// Spawn the sweeper; peers idle past `idle` get evicted.
    #[must_use]
    pub fn spawn(
        registry: PeerRegistry,
        pending: Arc<PendingTable>,
        hub: Arc<EventHub>,
        idle: Duration,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("tcnet-reaper".to_string())
            .spawn(move || {
                reaper_loop(registry, pending, hub, idle, shutdown_clone);
            })
            .expect("spawn reaper thread");

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

impl Drop for PeerReaper {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn reaper_loop(
    registry: PeerRegistry,
    pending: Arc<PendingTable>,
    hub: Arc<EventHub>,
    idle: Duration,
    shutdown: Arc<AtomicBool>,
) {
    log::debug!("[reaper] started, idle threshold {:?}", idle);

    while !shutdown.load(Ordering::Relaxed) {
        thread::sleep(SWEEP_INTERVAL.min(idle));

        for info in registry.evict_idle(idle) {
            log::info!(
                "[reaper] evicting silent peer {} '{}' (idle > {:?})",
                info.node_id,
                info.node_name,
                idle
            );
            pending.fail_peer(info.node_id, Error::PeerGone { node_id: info.node_id });
            hub.publish(Event::PeerRemoved(info));
        }
    }

    log::debug!("[reaper] stopped");
}
