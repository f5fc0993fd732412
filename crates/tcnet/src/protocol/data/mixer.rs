// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mixer state payload (Data sub-type 150).
//!
//! A wide snapshot of the mixer's continuous controls: master section, filter
//! and effect sends, plus six channel strips at a 24-byte stride (14 bytes of
//! fields per strip).
//!
//! # Wire format (548 bytes, selected offsets)
//!
//! ```text
//! offset  size  field
//! 25      1     mixer id
//! 26      1     mixer type
//! 29      16    mixer name (ASCII, NUL-padded)
//! 59..114       master / mic / booth / filter / fx fields (u8 each,
//!               see `MixerData`)
//! 125+24n 14    channel strip n (n = 0..6):
//!   +0 source, +1 audio level, +2 fader, +3 trim, +4 comp,
//!   +5 eq hi, +6 eq hi-mid, +7 eq low-mid, +8 eq low,
//!   +9 filter color, +10 send, +11 cue A, +12 cue B,
//!   +13 crossfader assign
//! ```

use crate::protocol::codec::{self, CodecResult};

/// Fixed mixer payload datagram length.
pub const MIXER_LEN: usize = 548;

/// Channel strips carried per packet.
pub const MIXER_CHANNELS: usize = 6;

const CHANNEL_TABLE_OFFSET: usize = 125;
const CHANNEL_STRIDE: usize = 24;
const MIXER_NAME_LEN: usize = 16;

/// One channel strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerChannel {
    pub source: u8,
    pub audio_level: u8,
    pub fader: u8,
    pub trim: u8,
    pub comp: u8,
    pub eq_hi: u8,
    pub eq_hi_mid: u8,
    pub eq_low_mid: u8,
    pub eq_low: u8,
    pub filter_color: u8,
    pub send: u8,
    pub cue_a: bool,
    pub cue_b: bool,
    pub crossfader_assign: u8,
}

impl MixerChannel {
    fn decode(buf: &[u8], offset: usize) -> CodecResult<Self> {
        Ok(Self {
            source: codec::read_u8(buf, offset)?,
            audio_level: codec::read_u8(buf, offset + 1)?,
            fader: codec::read_u8(buf, offset + 2)?,
            trim: codec::read_u8(buf, offset + 3)?,
            comp: codec::read_u8(buf, offset + 4)?,
            eq_hi: codec::read_u8(buf, offset + 5)?,
            eq_hi_mid: codec::read_u8(buf, offset + 6)?,
            eq_low_mid: codec::read_u8(buf, offset + 7)?,
            eq_low: codec::read_u8(buf, offset + 8)?,
            filter_color: codec::read_u8(buf, offset + 9)?,
            send: codec::read_u8(buf, offset + 10)?,
            cue_a: codec::read_u8(buf, offset + 11)? != 0,
            cue_b: codec::read_u8(buf, offset + 12)? != 0,
            crossfader_assign: codec::read_u8(buf, offset + 13)?,
        })
    }
}

/// Full mixer snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerData {
    pub mixer_id: u8,
    pub mixer_type: u8,
    pub mixer_name: String,
    pub mic_eq_hi: u8,
    pub mic_eq_low: u8,
    pub master_audio: u8,
    pub master_fader: u8,
    pub link_cue_a: u8,
    pub link_cue_b: u8,
    pub master_filter: u8,
    pub master_cue_a: u8,
    pub master_cue_b: u8,
    pub master_isolator_on: u8,
    pub iso_hi: u8,
    pub iso_mid: u8,
    pub iso_low: u8,
    pub filter_hpf: u8,
    pub filter_lpf: u8,
    pub filter_res: u8,
    pub send_fx_effect: u8,
    pub send_fx_ext1: u8,
    pub send_fx_ext2: u8,
    pub send_fx_master_mix: u8,
    pub size_feedback: u8,
    pub fx_time: u8,
    pub fx_hpf: u8,
    pub fx_level: u8,
    pub send_return3_source: u8,
    pub send_return3_type: u8,
    pub send_return3_on: u8,
    pub send_return3_level: u8,
    pub ch_fader_curve: u8,
    pub crossfader_curve: u8,
    pub crossfader: u8,
    pub beat_fx_on: u8,
    pub beat_fx_depth: u8,
    pub beat_fx_channel: u8,
    pub beat_fx_select: u8,
    pub beat_fx_freq_hi: u8,
    pub beat_fx_freq_mid: u8,
    pub beat_fx_freq_low: u8,
    pub headphones_pre_eq: u8,
    pub headphones_a_level: u8,
    pub headphones_a_mix: u8,
    pub headphones_b_level: u8,
    pub headphones_b_mix: u8,
    pub booth_level: u8,
    pub booth_eq_hi: u8,
    pub booth_eq_low: u8,
    pub channels: Vec<MixerChannel>,
}

impl MixerData {
    pub fn decode(buf: &[u8]) -> CodecResult<Self> {
        let mut channels = Vec::with_capacity(MIXER_CHANNELS);
        for ch in 0..MIXER_CHANNELS {
            channels.push(MixerChannel::decode(
                buf,
                CHANNEL_TABLE_OFFSET + ch * CHANNEL_STRIDE,
            )?);
        }
        Ok(Self {
            mixer_id: codec::read_u8(buf, 25)?,
            mixer_type: codec::read_u8(buf, 26)?,
            mixer_name: codec::read_ascii(buf, 29, MIXER_NAME_LEN)?,
            mic_eq_hi: codec::read_u8(buf, 59)?,
            mic_eq_low: codec::read_u8(buf, 60)?,
            master_audio: codec::read_u8(buf, 61)?,
            master_fader: codec::read_u8(buf, 62)?,
            link_cue_a: codec::read_u8(buf, 67)?,
            link_cue_b: codec::read_u8(buf, 68)?,
            master_filter: codec::read_u8(buf, 69)?,
            master_cue_a: codec::read_u8(buf, 71)?,
            master_cue_b: codec::read_u8(buf, 72)?,
            master_isolator_on: codec::read_u8(buf, 74)?,
            iso_hi: codec::read_u8(buf, 75)?,
            iso_mid: codec::read_u8(buf, 76)?,
            iso_low: codec::read_u8(buf, 77)?,
            filter_hpf: codec::read_u8(buf, 79)?,
            filter_lpf: codec::read_u8(buf, 80)?,
            filter_res: codec::read_u8(buf, 81)?,
            send_fx_effect: codec::read_u8(buf, 84)?,
            send_fx_ext1: codec::read_u8(buf, 85)?,
            send_fx_ext2: codec::read_u8(buf, 86)?,
            send_fx_master_mix: codec::read_u8(buf, 87)?,
            size_feedback: codec::read_u8(buf, 88)?,
            fx_time: codec::read_u8(buf, 89)?,
            fx_hpf: codec::read_u8(buf, 90)?,
            fx_level: codec::read_u8(buf, 91)?,
            send_return3_source: codec::read_u8(buf, 92)?,
            send_return3_type: codec::read_u8(buf, 93)?,
            send_return3_on: codec::read_u8(buf, 94)?,
            send_return3_level: codec::read_u8(buf, 95)?,
            ch_fader_curve: codec::read_u8(buf, 97)?,
            crossfader_curve: codec::read_u8(buf, 98)?,
            crossfader: codec::read_u8(buf, 99)?,
            beat_fx_on: codec::read_u8(buf, 100)?,
            beat_fx_depth: codec::read_u8(buf, 101)?,
            beat_fx_channel: codec::read_u8(buf, 102)?,
            beat_fx_select: codec::read_u8(buf, 103)?,
            beat_fx_freq_hi: codec::read_u8(buf, 104)?,
            beat_fx_freq_mid: codec::read_u8(buf, 105)?,
            beat_fx_freq_low: codec::read_u8(buf, 106)?,
            headphones_pre_eq: codec::read_u8(buf, 107)?,
            headphones_a_level: codec::read_u8(buf, 108)?,
            headphones_a_mix: codec::read_u8(buf, 109)?,
            headphones_b_level: codec::read_u8(buf, 110)?,
            headphones_b_mix: codec::read_u8(buf, 111)?,
            booth_level: codec::read_u8(buf, 112)?,
            booth_eq_hi: codec::read_u8(buf, 113)?,
            booth_eq_low: codec::read_u8(buf, 114)?,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixer_decode() {
        let mut buf = vec![0u8; MIXER_LEN];
        buf[25] = 1;
        buf[26] = 2;
        buf[29..35].copy_from_slice(b"DJM900");
        buf[61] = 100; // master audio
        buf[99] = 64; // crossfader centred
        buf[112] = 80; // booth level

        // Channel 1: fader up, cue A on.
        buf[125] = 1;
        buf[125 + 2] = 127;
        buf[125 + 11] = 1;

        // Channel 6 lives at 245 and ends at 259.
        buf[245 + 2] = 90;
        buf[245 + 12] = 1;

        let mixer = MixerData::decode(&buf).expect("decode mixer");
        assert_eq!(mixer.mixer_id, 1);
        assert_eq!(mixer.mixer_name, "DJM900");
        assert_eq!(mixer.master_audio, 100);
        assert_eq!(mixer.crossfader, 64);
        assert_eq!(mixer.booth_level, 80);
        assert_eq!(mixer.channels.len(), MIXER_CHANNELS);
        assert_eq!(mixer.channels[0].fader, 127);
        assert!(mixer.channels[0].cue_a);
        assert!(!mixer.channels[0].cue_b);
        assert_eq!(mixer.channels[5].fader, 90);
        assert!(mixer.channels[5].cue_b);
    }

    #[test]
    fn test_mixer_truncated() {
        let buf = vec![0u8; 200];
        assert!(MixerData::decode(&buf).is_err());
    }
}
