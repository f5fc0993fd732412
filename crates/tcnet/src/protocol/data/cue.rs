// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cue data payload (Data sub-type 12).
//!
//! Eighteen cue slots at a 22-byte stride; only the first 14 bytes of each
//! slot carry fields.
//!
//! # Wire format (436 bytes)
//!
//! ```text
//! offset  size  field
//! 25      1     layer id
//! 42      4     loop in (u32 LE, ms)
//! 46      4     loop out (u32 LE, ms)
//! 47+22n  ..    cue slot n (n = 0..18):
//!   +0    1     cue type
//!   +2    4     in time (u32 LE, ms)
//!   +6    4     out time (u32 LE, ms)
//!   +11   3     color (r, g, b)
//! ```

use crate::protocol::codec::{self, CodecResult};

/// Fixed cue payload datagram length.
pub const CUE_LEN: usize = 436;

/// Cue slots carried per packet.
pub const CUE_SLOTS: usize = 18;

const CUE_TABLE_OFFSET: usize = 47;
const CUE_STRIDE: usize = 22;

/// RGB color attached to a cue point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One cue slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub cue_type: u8,
    /// Cue-in position in milliseconds.
    pub in_time_ms: u32,
    /// Cue-out position in milliseconds.
    pub out_time_ms: u32,
    pub color: CueColor,
}

impl Cue {
    fn decode(buf: &[u8], offset: usize) -> CodecResult<Self> {
        Ok(Self {
            cue_type: codec::read_u8(buf, offset)?,
            in_time_ms: codec::read_u32_le(buf, offset + 2)?,
            out_time_ms: codec::read_u32_le(buf, offset + 6)?,
            color: CueColor {
                r: codec::read_u8(buf, offset + 11)?,
                g: codec::read_u8(buf, offset + 12)?,
                b: codec::read_u8(buf, offset + 13)?,
            },
        })
    }
}

/// Cue table for one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueData {
    pub layer: u8,
    /// Active loop-in position in milliseconds.
    pub loop_in_ms: u32,
    /// Active loop-out position in milliseconds.
    pub loop_out_ms: u32,
    pub cues: Vec<Cue>,
}

impl CueData {
    pub fn decode(buf: &[u8]) -> CodecResult<Self> {
        let mut cues = Vec::with_capacity(CUE_SLOTS);
        for slot in 0..CUE_SLOTS {
            cues.push(Cue::decode(buf, CUE_TABLE_OFFSET + slot * CUE_STRIDE)?);
        }
        Ok(Self {
            layer: codec::read_u8(buf, 25)?,
            loop_in_ms: codec::read_u32_le(buf, 42)?,
            loop_out_ms: codec::read_u32_le(buf, 46)?,
            cues,
        })
    }
}
