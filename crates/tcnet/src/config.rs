// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client configuration and protocol defaults.
//!
//! Timing defaults live here so that no other module hardcodes them. The
//! wire-level constants (magic, ports, field widths) are in
//! `protocol::constants`.

use crate::protocol::constants::{NODE_NAME_LEN, VENDOR_NAME_LEN};
use std::time::Duration;

/// Default period between OptIn keep-alive announcements.
pub const DEFAULT_OPT_IN_INTERVAL: Duration = Duration::from_millis(1000);

/// Default multiplier on the OptIn interval after which a silent peer is
/// evicted.
pub const DEFAULT_PEER_IDLE_THRESHOLD: u32 = 5;

/// Default deadline for a data request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default time `connect` waits for the first peer before giving up on the
/// quiet segment and returning anyway.
pub const DEFAULT_DISCOVERY_GRACE: Duration = Duration::from_millis(2000);

/// Default per-subscriber event buffer depth.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Session configuration.
///
/// `Default` gives a working client on the primary interface; override
/// fields as needed before passing the config to `Client::connect`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Local NIC for broadcast send and broadcast-address derivation.
    /// `None` selects the first non-loopback interface.
    pub broadcast_interface: Option<String>,
    /// Advertised node name (at most 8 ASCII characters).
    pub node_name: String,
    /// Advertised vendor name (at most 16 ASCII characters).
    pub vendor_name: String,
    /// Advertised application name (at most 16 ASCII characters).
    pub app_name: String,
    /// Period between OptIn announcements.
    pub opt_in_interval: Duration,
    /// Multiplier on `opt_in_interval` after which a silent peer is evicted.
    pub peer_idle_threshold: u32,
    /// Default deadline for `request_data`.
    pub request_timeout: Duration,
    /// How long `connect` waits for the first peer.
    pub discovery_grace: Duration,
    /// Bounded buffer depth per event subscriber.
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            broadcast_interface: None,
            node_name: "TCNET".to_string(),
            vendor_name: "tcnet-rs".to_string(),
            app_name: "tcnet".to_string(),
            opt_in_interval: DEFAULT_OPT_IN_INTERVAL,
            peer_idle_threshold: DEFAULT_PEER_IDLE_THRESHOLD,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            discovery_grace: DEFAULT_DISCOVERY_GRACE,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

impl ClientConfig {
    /// Validate name lengths and encodings against the wire field widths.
    pub fn validate(&self) -> Result<(), String> {
        check_ascii("node_name", &self.node_name, NODE_NAME_LEN)?;
        check_ascii("vendor_name", &self.vendor_name, VENDOR_NAME_LEN)?;
        check_ascii("app_name", &self.app_name, VENDOR_NAME_LEN)?;
        if self.opt_in_interval.is_zero() {
            return Err("opt_in_interval must be non-zero".to_string());
        }
        if self.peer_idle_threshold == 0 {
            return Err("peer_idle_threshold must be non-zero".to_string());
        }
        Ok(())
    }

    /// Idle duration after which a silent peer is evicted.
    pub fn peer_idle_timeout(&self) -> Duration {
        self.opt_in_interval * self.peer_idle_threshold
    }
}

fn check_ascii(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    if !value.is_ascii() {
        return Err(format!("{} must be ASCII", field));
    }
    if value.len() > max_len {
        return Err(format!(
            "{} must be at most {} characters (got {})",
            field,
            max_len,
            value.len()
        ));
    }
    Ok(())
}
