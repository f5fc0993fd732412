// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Status, Time and TimeSync broadcast packets.
//!
//! These are periodic telemetry frames: a node summarises all eight of its
//! layers in a single datagram. The client decodes them for the event stream;
//! they are never solicited through the request path.
//!
//! # Status wire format (300 bytes)
//!
//! ```text
//! offset  size  field
//! 34      8     layer source (u8 per layer)
//! 42      8     layer status (u8 per layer)
//! 50      32    track id (u32 LE per layer)
//! 83      1     SMPTE mode
//! 84      1     auto master mode
//! 172     128   layer names (8 x 16-byte ASCII, stride 16)
//! ```
//!
//! # Time wire format (154 bytes)
//!
//! ```text
//! 24      32    layer current time (u32 LE per layer, ms)
//! 56      32    layer total time (u32 LE per layer, ms)
//! 88      8     beat marker (u8 per layer)
//! 96      8     layer state (u8 per layer)
//! 105     1     SMPTE mode
//! 106     48    timecodes (8 x 6 bytes, stride 6)
//! ```
//!
//! # TimeSync wire format (32 bytes)
//!
//! ```text
//! 24      1     step
//! 26      2     node listener port (u16 LE)
//! 28      4     remote timestamp (u32 LE)
//! ```

use super::codec::{self, CodecResult};
use super::header::ManagementHeader;

/// Fixed Status datagram length.
pub const STATUS_LEN: usize = 300;

/// Fixed Time datagram length.
pub const TIME_LEN: usize = 154;

/// Fixed TimeSync datagram length.
pub const TIME_SYNC_LEN: usize = 32;

/// Layers summarised per Status/Time frame.
pub const LAYER_COUNT: usize = 8;

const LAYER_NAME_LEN: usize = 16;
const LAYER_NAME_STRIDE: usize = 16;
const TIMECODE_STRIDE: usize = 6;

/// Running state of a layer's timecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimecodeState {
    Stopped,
    Running,
    ForceReSync,
    Other(u8),
}

impl TimecodeState {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Stopped,
            1 => Self::Running,
            2 => Self::ForceReSync,
            other => Self::Other(other),
        }
    }
}

/// Six-byte SMPTE timecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timecode {
    pub mode: u8,
    pub state: TimecodeState,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub frames: u8,
}

impl Timecode {
    fn decode(buf: &[u8], offset: usize) -> CodecResult<Self> {
        Ok(Self {
            mode: codec::read_u8(buf, offset)?,
            state: TimecodeState::from_raw(codec::read_u8(buf, offset + 1)?),
            hours: codec::read_u8(buf, offset + 2)?,
            minutes: codec::read_u8(buf, offset + 3)?,
            seconds: codec::read_u8(buf, offset + 4)?,
            frames: codec::read_u8(buf, offset + 5)?,
        })
    }
}

/// Per-layer playback status summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    pub header: ManagementHeader,
    pub layer_sources: [u8; LAYER_COUNT],
    pub layer_statuses: [u8; LAYER_COUNT],
    pub track_ids: [u32; LAYER_COUNT],
    pub smpte_mode: u8,
    pub auto_master_mode: u8,
    pub layer_names: [String; LAYER_COUNT],
}

impl StatusPacket {
    pub fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        let mut layer_sources = [0u8; LAYER_COUNT];
        let mut layer_statuses = [0u8; LAYER_COUNT];
        let mut track_ids = [0u32; LAYER_COUNT];
        let mut layer_names: [String; LAYER_COUNT] = Default::default();

        for i in 0..LAYER_COUNT {
            layer_sources[i] = codec::read_u8(buf, 34 + i)?;
            layer_statuses[i] = codec::read_u8(buf, 42 + i)?;
            track_ids[i] = codec::read_u32_le(buf, 50 + i * 4)?;
            layer_names[i] =
                codec::read_ascii(buf, 172 + i * LAYER_NAME_STRIDE, LAYER_NAME_LEN)?;
        }

        Ok(Self {
            header,
            layer_sources,
            layer_statuses,
            track_ids,
            smpte_mode: codec::read_u8(buf, 83)?,
            auto_master_mode: codec::read_u8(buf, 84)?,
            layer_names,
        })
    }
}

/// Per-layer time report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimePacket {
    pub header: ManagementHeader,
    /// Current position per layer, milliseconds.
    pub layer_current_times: [u32; LAYER_COUNT],
    /// Track length per layer, milliseconds.
    pub layer_total_times: [u32; LAYER_COUNT],
    pub beat_markers: [u8; LAYER_COUNT],
    pub layer_states: [u8; LAYER_COUNT],
    pub smpte_mode: u8,
    pub timecodes: [Timecode; LAYER_COUNT],
}

impl TimePacket {
    pub fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        let mut layer_current_times = [0u32; LAYER_COUNT];
        let mut layer_total_times = [0u32; LAYER_COUNT];
        let mut beat_markers = [0u8; LAYER_COUNT];
        let mut layer_states = [0u8; LAYER_COUNT];
        let mut timecodes = [Timecode {
            mode: 0,
            state: TimecodeState::Stopped,
            hours: 0,
            minutes: 0,
            seconds: 0,
            frames: 0,
        }; LAYER_COUNT];

        for i in 0..LAYER_COUNT {
            layer_current_times[i] = codec::read_u32_le(buf, 24 + i * 4)?;
            layer_total_times[i] = codec::read_u32_le(buf, 56 + i * 4)?;
            beat_markers[i] = codec::read_u8(buf, 88 + i)?;
            layer_states[i] = codec::read_u8(buf, 96 + i)?;
            timecodes[i] = Timecode::decode(buf, 106 + i * TIMECODE_STRIDE)?;
        }

        Ok(Self {
            header,
            layer_current_times,
            layer_total_times,
            beat_markers,
            layer_states,
            smpte_mode: codec::read_u8(buf, 105)?,
            timecodes,
        })
    }
}

/// Time synchronisation step.
///
/// The listener port is read from body offset 26. Some field maps place it
/// inside the header instead; offset 26 keeps it in the packet body next to
/// the remote timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSyncPacket {
    pub header: ManagementHeader,
    pub step: u8,
    pub node_listener_port: u16,
    pub remote_timestamp: u32,
}

impl TimeSyncPacket {
    pub fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        Ok(Self {
            header,
            step: codec::read_u8(buf, 24)?,
            node_listener_port: codec::read_u16_le(buf, 26)?,
            remote_timestamp: codec::read_u32_le(buf, 28)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::CodecError;
    use crate::protocol::constants::{MessageType, NodeType, PROTOCOL_VERSION_MAJOR};

    fn header_bytes(message_type: MessageType, total_len: usize) -> Vec<u8> {
        let header = ManagementHeader {
            node_id: 9,
            version_major: PROTOCOL_VERSION_MAJOR,
            version_minor: 0,
            message_type: message_type.raw(),
            node_name: "CDJ".to_string(),
            sequence: 0,
            node_type: NodeType::Master.raw(),
            node_options: 0,
            timestamp: 0,
        };
        let mut buf = vec![0u8; total_len];
        header.encode_into(&mut buf).expect("encode header");
        buf
    }

    #[test]
    fn test_status_decode_layer_fields() {
        let mut buf = header_bytes(MessageType::Status, STATUS_LEN);
        buf[34] = 1; // layer 1 source
        buf[42 + 2] = 7; // layer 3 status
        buf[50 + 4..50 + 8].copy_from_slice(&0xAABBCCDDu32.to_le_bytes()); // layer 2 track
        buf[83] = 1;
        buf[84] = 2;
        buf[172..172 + 5].copy_from_slice(b"DECKA");
        buf[172 + 16..172 + 16 + 5].copy_from_slice(b"DECKB");

        let header = ManagementHeader::decode(&buf).expect("decode header");
        let status = StatusPacket::decode(&buf, header).expect("decode Status");
        assert_eq!(status.layer_sources[0], 1);
        assert_eq!(status.layer_statuses[2], 7);
        assert_eq!(status.track_ids[1], 0xAABBCCDD);
        assert_eq!(status.smpte_mode, 1);
        assert_eq!(status.auto_master_mode, 2);
        assert_eq!(status.layer_names[0], "DECKA");
        assert_eq!(status.layer_names[1], "DECKB");
        assert_eq!(status.layer_names[7], "");
    }

    #[test]
    fn test_time_decode_timecodes() {
        let mut buf = header_bytes(MessageType::Time, TIME_LEN);
        buf[24..28].copy_from_slice(&90_000u32.to_le_bytes()); // layer 1 position
        buf[56..60].copy_from_slice(&240_000u32.to_le_bytes()); // layer 1 length
        buf[88] = 1;
        buf[96] = 3;
        buf[105] = 1;
        // Layer 1 timecode: mode 1, running, 01:02:03.04
        buf[106..112].copy_from_slice(&[1, 1, 1, 2, 3, 4]);

        let header = ManagementHeader::decode(&buf).expect("decode header");
        let time = TimePacket::decode(&buf, header).expect("decode Time");
        assert_eq!(time.layer_current_times[0], 90_000);
        assert_eq!(time.layer_total_times[0], 240_000);
        assert_eq!(time.beat_markers[0], 1);
        assert_eq!(time.layer_states[0], 3);
        assert_eq!(time.smpte_mode, 1);
        assert_eq!(
            time.timecodes[0],
            Timecode {
                mode: 1,
                state: TimecodeState::Running,
                hours: 1,
                minutes: 2,
                seconds: 3,
                frames: 4,
            }
        );
        assert_eq!(time.timecodes[7].state, TimecodeState::Stopped);
    }

    #[test]
    fn test_time_sync_decode() {
        let mut buf = header_bytes(MessageType::TimeSync, TIME_SYNC_LEN);
        buf[24] = 2;
        buf[26..28].copy_from_slice(&65000u16.to_le_bytes());
        buf[28..32].copy_from_slice(&777u32.to_le_bytes());

        let header = ManagementHeader::decode(&buf).expect("decode header");
        let sync = TimeSyncPacket::decode(&buf, header).expect("decode TimeSync");
        assert_eq!(sync.step, 2);
        assert_eq!(sync.node_listener_port, 65000);
        assert_eq!(sync.remote_timestamp, 777);
    }

    #[test]
    fn test_status_truncated() {
        let buf = header_bytes(MessageType::Status, 120);
        let header = ManagementHeader::decode(&buf).expect("decode header");
        assert!(matches!(
            StatusPacket::decode(&buf, header),
            Err(CodecError::Truncated { .. })
        ));
    }
}
