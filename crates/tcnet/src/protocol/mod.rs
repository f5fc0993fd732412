// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TCNet wire protocol: packet layouts, decode dispatch, encoders.
//!
//! The protocol is a family of heterogeneously-shaped packets over UDP, all
//! prefixed by the 24-byte management header. Decoding is a pure function
//! from bytes to a tagged `Packet` value: an exhaustive match on the header's
//! message-type byte, with a nested match on the sub-type byte for Data
//! packets. There is no registry and no dynamic dispatch.
//!
//! Encoders exist for the packets this client sends: OptIn, OptOut, Request.

pub mod codec;
pub mod constants;
pub mod data;
pub mod header;

mod announce;
mod request;
mod status;

#[cfg(test)]
mod tests;

pub use announce::{OptInPacket, OptOutPacket, OPT_IN_LEN, OPT_OUT_LEN};
pub use codec::{CodecError, CodecResult};
pub use constants::{DataType, MessageType, NodeType};
pub use data::DataPayload;
pub use header::ManagementHeader;
pub use request::{ErrorPacket, RequestPacket, ERROR_LEN, REQUEST_LEN};
pub use status::{
    StatusPacket, TimePacket, TimeSyncPacket, Timecode, TimecodeState, LAYER_COUNT, STATUS_LEN,
    TIME_LEN, TIME_SYNC_LEN,
};

use std::fmt;

/// Errors raised while turning a datagram into a `Packet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Malformed frame (short buffer, bad magic/version, bad text field).
    Codec(CodecError),
    /// Recognized type with no decoder (unknown codes, beat grid).
    Unsupported {
        message_type: u8,
        data_type: Option<u8>,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "{}", e),
            Self::Unsupported {
                message_type,
                data_type: Some(dt),
            } => write!(
                f,
                "unsupported data sub-type {} (message type {})",
                dt, message_type
            ),
            Self::Unsupported { message_type, .. } => {
                write!(f, "unsupported message type {}", message_type)
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            Self::Unsupported { .. } => None,
        }
    }
}

impl From<CodecError> for DecodeError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// Keyboard input packet.
///
/// The frame declares a payload size but carries a fixed two-byte payload in
/// practice; both are recorded verbatim, nothing is reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardPacket {
    pub header: ManagementHeader,
    pub declared_size: u32,
    pub data: Vec<u8>,
}

impl KeyboardPacket {
    fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        let declared_size = codec::read_u32_le(buf, 24)?;
        Ok(Self {
            header,
            declared_size,
            data: buf.get(28..).unwrap_or(&[]).to_vec(),
        })
    }
}

/// A recognized packet type whose body this client does not interpret
/// (ApplicationData, Control, Text, File).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaquePacket {
    pub header: ManagementHeader,
    pub message_type: MessageType,
    pub body: Vec<u8>,
}

/// Any decoded TCNet packet, tagged by message type.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    OptIn(OptInPacket),
    OptOut(OptOutPacket),
    Status(StatusPacket),
    TimeSync(TimeSyncPacket),
    Error(ErrorPacket),
    Request(RequestPacket),
    Time(TimePacket),
    Data {
        header: ManagementHeader,
        payload: DataPayload,
    },
    Keyboard(KeyboardPacket),
    Opaque(OpaquePacket),
}

impl Packet {
    /// The management header of the packet.
    pub fn header(&self) -> &ManagementHeader {
        match self {
            Self::OptIn(p) => &p.header,
            Self::OptOut(p) => &p.header,
            Self::Status(p) => &p.header,
            Self::TimeSync(p) => &p.header,
            Self::Error(p) => &p.header,
            Self::Request(p) => &p.header,
            Self::Time(p) => &p.header,
            Self::Data { header, .. } => header,
            Self::Keyboard(p) => &p.header,
            Self::Opaque(p) => &p.header,
        }
    }
}

/// Decode one datagram into a tagged packet.
///
/// Validates the header (magic, major version) first, then dispatches on the
/// message-type byte. Unknown message types and undecodable Data sub-types
/// yield `DecodeError::Unsupported`; the caller decides whether that is an
/// event worth reporting or a frame to drop.
pub fn decode_packet(buf: &[u8]) -> Result<Packet, DecodeError> {
    let header = ManagementHeader::decode(buf)?;
    let message_type =
        MessageType::from_raw(header.message_type).ok_or(DecodeError::Unsupported {
            message_type: header.message_type,
            data_type: None,
        })?;

    let packet = match message_type {
        MessageType::OptIn => Packet::OptIn(OptInPacket::decode(buf, header)?),
        MessageType::OptOut => Packet::OptOut(OptOutPacket::decode(buf, header)?),
        MessageType::Status => Packet::Status(StatusPacket::decode(buf, header)?),
        MessageType::TimeSync => Packet::TimeSync(TimeSyncPacket::decode(buf, header)?),
        MessageType::Error => Packet::Error(ErrorPacket::decode(buf, header)?),
        MessageType::Request => Packet::Request(RequestPacket::decode(buf, header)?),
        MessageType::Time => Packet::Time(TimePacket::decode(buf, header)?),
        MessageType::Data => {
            let payload = data::decode_payload(buf)?;
            Packet::Data { header, payload }
        }
        MessageType::Keyboard => Packet::Keyboard(KeyboardPacket::decode(buf, header)?),
        MessageType::ApplicationData
        | MessageType::Control
        | MessageType::Text
        | MessageType::File => Packet::Opaque(OpaquePacket {
            header,
            message_type,
            body: buf.get(constants::HEADER_LEN..).unwrap_or(&[]).to_vec(),
        }),
    };

    Ok(packet)
}
