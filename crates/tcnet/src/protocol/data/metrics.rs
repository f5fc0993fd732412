// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Layer metrics payload (Data sub-type 2).
//!
//! # Wire format (122 bytes)
//!
//! ```text
//! offset  size  field
//! 25      1     layer id
//! 27      1     state
//! 29      1     sync master
//! 31      1     beat marker
//! 32      4     track length (u32 LE, ms)
//! 36      4     current position (u32 LE, ms)
//! 40      4     speed (u32 LE)
//! 57      4     beat number (u32 LE)
//! 112     4     bpm (u32 LE, hundredths)
//! 116     2     pitch bend (u16 LE)
//! 118     4     track id (u32 LE)
//! ```

use crate::protocol::codec::{self, CodecResult};

/// Fixed metrics payload datagram length.
pub const METRICS_LEN: usize = 122;

/// Live playback metrics for one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerMetrics {
    pub layer: u8,
    pub state: u8,
    pub sync_master: u8,
    pub beat_marker: u8,
    /// Track length in milliseconds.
    pub track_length_ms: u32,
    /// Playback position in milliseconds.
    pub current_position_ms: u32,
    pub speed: u32,
    pub beat_number: u32,
    /// Beats per minute, scaled by 100 (12850 = 128.50 BPM).
    pub bpm_hundredths: u32,
    pub pitch_bend: u16,
    pub track_id: u32,
}

impl LayerMetrics {
    pub fn decode(buf: &[u8]) -> CodecResult<Self> {
        Ok(Self {
            layer: codec::read_u8(buf, 25)?,
            state: codec::read_u8(buf, 27)?,
            sync_master: codec::read_u8(buf, 29)?,
            beat_marker: codec::read_u8(buf, 31)?,
            track_length_ms: codec::read_u32_le(buf, 32)?,
            current_position_ms: codec::read_u32_le(buf, 36)?,
            speed: codec::read_u32_le(buf, 40)?,
            beat_number: codec::read_u32_le(buf, 57)?,
            bpm_hundredths: codec::read_u32_le(buf, 112)?,
            pitch_bend: codec::read_u16_le(buf, 116)?,
            track_id: codec::read_u32_le(buf, 118)?,
        })
    }

    /// BPM as a floating point value.
    pub fn bpm(&self) -> f64 {
        f64::from(self.bpm_hundredths) / 100.0
    }
}
