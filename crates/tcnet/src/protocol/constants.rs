// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCNet protocol constants.
//!
//! Centralizes the magic bytes, version numbers, message type codes, data
//! sub-type codes and error codes used on the wire, so that no other module
//! hardcodes them.
//!
//! # Wire conventions
//!
//! - Every datagram starts with the 24-byte management header (see `header`).
//! - All multi-byte integers are little-endian.
//! - Strings are fixed-width ASCII (UTF-16LE for track metadata), NUL-padded
//!   on write and truncated at the first NUL on read.

/// TCNet magic bytes at header offset 4..7.
pub const TCNET_MAGIC: &[u8; 3] = b"TCN";

/// Protocol major version accepted by this implementation.
///
/// Datagrams carrying any other major version are rejected with
/// `CodecError::BadVersion` before dispatch.
pub const PROTOCOL_VERSION_MAJOR: u8 = 3;

/// Protocol minor version advertised in outbound headers.
pub const PROTOCOL_VERSION_MINOR: u8 = 3;

/// Management header length (prefix of every packet).
pub const HEADER_LEN: usize = 24;

/// Well-known UDP port for broadcast discovery and telemetry.
pub const BROADCAST_PORT: u16 = 60000;

/// Advertised node name width (ASCII, NUL-padded).
pub const NODE_NAME_LEN: usize = 8;

/// Advertised vendor/application name width (ASCII, NUL-padded).
pub const VENDOR_NAME_LEN: usize = 16;

// ============================================================================
// Message types (u8 at header offset 7)
// ============================================================================

/// Message type codes carried in the management header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Node joins the segment (broadcast, periodic keep-alive).
    OptIn = 2,
    /// Node leaves the segment.
    OptOut = 3,
    /// Per-layer playback status summary.
    Status = 5,
    /// Time synchronisation exchange.
    TimeSync = 10,
    /// Error notification in reply to a request.
    Error = 13,
    /// On-demand data request.
    Request = 20,
    /// Application-specific payload (recognized, not decoded).
    ApplicationData = 30,
    /// Control surface traffic (recognized, not decoded).
    Control = 101,
    /// Textual message (recognized, not decoded).
    Text = 128,
    /// Keyboard input (declared size + raw payload).
    Keyboard = 132,
    /// Data reply; sub-type byte at offset 24 selects the payload.
    Data = 200,
    /// Generic file transport (recognized, not decoded).
    File = 204,
    /// Per-layer time report.
    Time = 254,
}

impl MessageType {
    /// Map a wire code to a message type. `None` for codes this
    /// implementation does not know about.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            2 => Some(Self::OptIn),
            3 => Some(Self::OptOut),
            5 => Some(Self::Status),
            10 => Some(Self::TimeSync),
            13 => Some(Self::Error),
            20 => Some(Self::Request),
            30 => Some(Self::ApplicationData),
            101 => Some(Self::Control),
            128 => Some(Self::Text),
            132 => Some(Self::Keyboard),
            200 => Some(Self::Data),
            204 => Some(Self::File),
            254 => Some(Self::Time),
            _ => None,
        }
    }

    /// Wire code for this message type.
    pub fn raw(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// Data sub-types (u8 at offset 24 of any Data packet)
// ============================================================================

/// Payload selector inside a `Data` (200) packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    /// Live playback metrics (bpm, position, state).
    Metrics = 2,
    /// Track metadata (artist, title, key, track id).
    Metadata = 4,
    /// Beat grid. Layout is not decoded; requests surface `Unsupported`.
    BeatGrid = 8,
    /// Cue points, loop in/out.
    Cue = 12,
    /// Small waveform (2400 sample bytes per fragment).
    SmallWaveform = 16,
    /// Big waveform (4842 sample bytes per fragment).
    BigWaveform = 32,
    /// Mixer state snapshot.
    Mixer = 150,
}

impl DataType {
    /// Map a wire code to a data sub-type.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            2 => Some(Self::Metrics),
            4 => Some(Self::Metadata),
            8 => Some(Self::BeatGrid),
            12 => Some(Self::Cue),
            16 => Some(Self::SmallWaveform),
            32 => Some(Self::BigWaveform),
            150 => Some(Self::Mixer),
            _ => None,
        }
    }

    /// Wire code for this sub-type.
    pub fn raw(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// Node types (u8 at header offset 17)
// ============================================================================

/// Role a node advertises in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Auto,
    /// Emits authoritative timing for the segment.
    Master,
    Slave,
    Repeater,
    /// Codes the protocol may add later; kept verbatim.
    Other(u8),
}

impl NodeType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Auto,
            2 => Self::Master,
            4 => Self::Slave,
            8 => Self::Repeater,
            other => Self::Other(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Self::Auto => 1,
            Self::Master => 2,
            Self::Slave => 4,
            Self::Repeater => 8,
            Self::Other(raw) => raw,
        }
    }
}

// ============================================================================
// Error notification codes (u16 at offset 26 of an Error packet)
// ============================================================================

/// Peer did not recognize the request.
pub const ERR_REQUEST_UNKNOWN: u16 = 0;

/// Peer cannot satisfy the request in its current state.
pub const ERR_REQUEST_NOT_POSSIBLE: u16 = 13;

/// Peer has no data for the requested layer.
pub const ERR_REQUEST_DATA_EMPTY: u16 = 14;

/// Positive acknowledgment; not an error despite the message type.
pub const ERR_REQUEST_RESPONSE_OK: u16 = 255;
