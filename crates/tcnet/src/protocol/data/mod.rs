// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data packet payloads.
//!
//! Every Data (200) packet carries a sub-type byte at offset 24 selecting one
//! of the payload layouts in this module. Dispatch is an exhaustive match on
//! that byte; sub-types the protocol defines but this client cannot decode
//! (beat grid) surface `DecodeError::Unsupported` without touching any state.

mod cue;
mod metadata;
mod metrics;
mod mixer;
mod waveform;

pub use cue::{Cue, CueColor, CueData, CUE_LEN, CUE_SLOTS};
pub use metadata::{TrackMetadata, METADATA_LEN};
pub use metrics::{LayerMetrics, METRICS_LEN};
pub use mixer::{MixerChannel, MixerData, MIXER_CHANNELS, MIXER_LEN};
pub use waveform::{
    WaveformData, WaveformFragment, WaveformPoint, WaveformSize, BIG_WAVEFORM_LEN,
    SMALL_WAVEFORM_LEN,
};

use super::codec;
use super::constants::{DataType, MessageType};
use super::DecodeError;

/// Decoded Data packet payload, tagged by sub-type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataPayload {
    Metrics(LayerMetrics),
    Metadata(TrackMetadata),
    Cue(CueData),
    Waveform(WaveformFragment),
    Mixer(MixerData),
}

impl DataPayload {
    /// The sub-type code this payload answers to.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Metrics(_) => DataType::Metrics,
            Self::Metadata(_) => DataType::Metadata,
            Self::Cue(_) => DataType::Cue,
            Self::Waveform(w) => w.size.data_type(),
            Self::Mixer(_) => DataType::Mixer,
        }
    }

    /// The layer (or mixer id) byte the payload carries at offset 25.
    pub fn layer(&self) -> u8 {
        match self {
            Self::Metrics(m) => m.layer,
            Self::Metadata(m) => m.layer,
            Self::Cue(c) => c.layer,
            Self::Waveform(w) => w.layer,
            Self::Mixer(m) => m.mixer_id,
        }
    }
}

/// Decode the body of a Data packet by its sub-type byte.
pub fn decode_payload(buf: &[u8]) -> Result<DataPayload, DecodeError> {
    let sub_type = codec::read_u8(buf, 24)?;
    let data_type = DataType::from_raw(sub_type).ok_or(DecodeError::Unsupported {
        message_type: MessageType::Data.raw(),
        data_type: Some(sub_type),
    })?;

    match data_type {
        DataType::Metrics => Ok(DataPayload::Metrics(LayerMetrics::decode(buf)?)),
        DataType::Metadata => Ok(DataPayload::Metadata(TrackMetadata::decode(buf)?)),
        DataType::Cue => Ok(DataPayload::Cue(CueData::decode(buf)?)),
        DataType::SmallWaveform => Ok(DataPayload::Waveform(WaveformFragment::decode(
            buf,
            WaveformSize::Small,
        )?)),
        DataType::BigWaveform => Ok(DataPayload::Waveform(WaveformFragment::decode(
            buf,
            WaveformSize::Big,
        )?)),
        DataType::Mixer => Ok(DataPayload::Mixer(MixerData::decode(buf)?)),
        // Layout is ambiguous in the field; recognized but never decoded.
        DataType::BeatGrid => Err(DecodeError::Unsupported {
            message_type: MessageType::Data.raw(),
            data_type: Some(sub_type),
        }),
    }
}
