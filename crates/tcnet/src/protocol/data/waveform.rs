// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Waveform payloads (Data sub-types 16 and 32).
//!
//! Waveforms larger than one datagram are fragmented: every fragment repeats
//! the layer and declares `total_packets` plus its own `packet_number`
//! (0-based). Reassembly lives in the engine; this module only decodes one
//! fragment.
//!
//! # Wire format (2442 bytes small / 4884 bytes big)
//!
//! ```text
//! offset  size  field
//! 25      1     layer id
//! 26      4     data size (u32 LE, sample bytes in this fragment)
//! 30      4     total packets (u32 LE)
//! 34      4     packet number (u32 LE, 0-based)
//! 42      n     sample bytes (n = data size)
//! ```
//!
//! Sample bytes alternate color and level.

use crate::protocol::codec::{self, CodecError, CodecResult};
use crate::protocol::constants::DataType;

/// Fixed small-waveform datagram length.
pub const SMALL_WAVEFORM_LEN: usize = 2442;

/// Fixed big-waveform datagram length.
pub const BIG_WAVEFORM_LEN: usize = 4884;

const SAMPLES_OFFSET: usize = 42;

/// Which of the two waveform resolutions a packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveformSize {
    Small,
    Big,
}

impl WaveformSize {
    /// The Data sub-type requesting this resolution.
    pub fn data_type(self) -> DataType {
        match self {
            Self::Small => DataType::SmallWaveform,
            Self::Big => DataType::BigWaveform,
        }
    }
}

/// One color/level pair from a waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformPoint {
    pub color: u8,
    pub level: u8,
}

/// A single waveform fragment as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformFragment {
    pub layer: u8,
    pub size: WaveformSize,
    /// Sample bytes carried by this fragment.
    pub data_size: u32,
    /// Fragments composing the full waveform.
    pub total_packets: u32,
    /// 0-based index of this fragment.
    pub packet_number: u32,
    pub samples: Vec<u8>,
}

impl WaveformFragment {
    pub fn decode(buf: &[u8], size: WaveformSize) -> CodecResult<Self> {
        let data_size = codec::read_u32_le(buf, 26)?;
        let samples = codec::read_bytes(buf, SAMPLES_OFFSET, data_size as usize)?.to_vec();
        let total_packets = codec::read_u32_le(buf, 30)?;
        if total_packets == 0 {
            return Err(CodecError::InvalidEncoding("waveform fragment count"));
        }
        Ok(Self {
            layer: codec::read_u8(buf, 25)?,
            size,
            data_size,
            total_packets,
            packet_number: codec::read_u32_le(buf, 34)?,
            samples,
        })
    }
}

/// A fully reassembled waveform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveformData {
    pub layer: u8,
    pub size: WaveformSize,
    /// Concatenated sample bytes of every fragment, in packet order.
    pub samples: Vec<u8>,
}

impl WaveformData {
    /// Iterate the samples as color/level pairs.
    pub fn points(&self) -> impl Iterator<Item = WaveformPoint> + '_ {
        self.samples.chunks_exact(2).map(|pair| WaveformPoint {
            color: pair[0],
            level: pair[1],
        })
    }
}
