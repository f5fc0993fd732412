// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors surfaced by client operations.
//!
//! Codec and protocol errors are never fatal to a session: a malformed
//! datagram is dropped with a diagnostic and the receive loops continue. Only
//! I/O failures on a session socket are fatal; they move the session into a
//! failed state that every later call reports.
//!
//! The enum is `Clone` (I/O causes are carried as strings at the boundary) so
//! a single completion value can fan out to every coalesced waiter of a
//! request.

use crate::protocol::{CodecError, DecodeError};
use std::fmt;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by TCNet client operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Wire errors
    // ========================================================================
    /// Malformed datagram (short, bad magic/version, bad text field).
    Codec(CodecError),
    /// Recognized packet type without a decoder (e.g. beat grid).
    Unsupported { data_type: u8 },

    // ========================================================================
    // Request errors
    // ========================================================================
    /// The peer answered with an error notification.
    Remote {
        node_id: u16,
        data_type: u8,
        layer: u8,
        code: u16,
    },
    /// No reply within the deadline.
    Timeout {
        node_id: u16,
        data_type: u8,
        layer: u8,
    },
    /// The targeted peer was evicted before the reply arrived.
    PeerGone { node_id: u16 },
    /// No peer available to send the request to.
    NoPeer,
    /// The session was disconnected while the request was pending.
    Shutdown,

    // ========================================================================
    // Configuration / transport errors
    // ========================================================================
    /// Invalid client configuration.
    Config(String),
    /// Interface selection failed.
    InvalidInterface(String),
    /// Socket bind failed.
    Bind(String),
    /// Datagram send failed.
    Send(String),
    /// A session socket failed; the session is unusable from here on.
    SessionFailed(String),
    /// Internal invariant violation (reply of the wrong shape, closed
    /// channel); indicates a bug rather than a network condition.
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec error: {}", e),
            Self::Unsupported { data_type } => {
                write!(f, "data type {} is not supported", data_type)
            }
            Self::Remote {
                node_id,
                data_type,
                layer,
                code,
            } => write!(
                f,
                "peer {} rejected request (data type {}, layer {}): code {}",
                node_id, data_type, layer, code
            ),
            Self::Timeout {
                node_id,
                data_type,
                layer,
            } => write!(
                f,
                "request to peer {} timed out (data type {}, layer {})",
                node_id, data_type, layer
            ),
            Self::PeerGone { node_id } => write!(f, "peer {} left the segment", node_id),
            Self::NoPeer => write!(f, "no peer available"),
            Self::Shutdown => write!(f, "session disconnected"),
            Self::Config(msg) => write!(f, "invalid configuration: {}", msg),
            Self::InvalidInterface(msg) => write!(f, "interface selection failed: {}", msg),
            Self::Bind(msg) => write!(f, "socket bind failed: {}", msg),
            Self::Send(msg) => write!(f, "send failed: {}", msg),
            Self::SessionFailed(msg) => write!(f, "session failed: {}", msg),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Codec(c) => Self::Codec(c),
            DecodeError::Unsupported { data_type, .. } => Self::Unsupported {
                data_type: data_type.unwrap_or(0),
            },
        }
    }
}
