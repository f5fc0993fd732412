// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request packets and their Error notifications.
//!
//! A Request is the only solicitation the client sends over unicast: it names
//! a data sub-type and a layer, and the peer answers with either a matching
//! Data packet or an Error notification echoing the same pair.
//!
//! # Request wire format (26 bytes)
//!
//! ```text
//! offset  size  field
//! 24      1     data type
//! 25      1     layer
//! ```
//!
//! # Error notification wire format (30 bytes)
//!
//! ```text
//! 24      1     data type
//! 25      1     layer id
//! 26      2     code (u16 LE); 255 is a positive acknowledgment
//! 28      2     message type the notification refers to (u16 LE)
//! ```

use super::codec::{self, CodecResult};
use super::header::ManagementHeader;

/// Fixed Request datagram length.
pub const REQUEST_LEN: usize = 26;

/// Fixed Error notification datagram length.
pub const ERROR_LEN: usize = 30;

/// On-demand data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPacket {
    pub header: ManagementHeader,
    pub data_type: u8,
    pub layer: u8,
}

impl RequestPacket {
    pub fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        Ok(Self {
            header,
            data_type: codec::read_u8(buf, 24)?,
            layer: codec::read_u8(buf, 25)?,
        })
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; REQUEST_LEN];
        self.header.encode_into(&mut buf)?;
        codec::write_u8(&mut buf, 24, self.data_type)?;
        codec::write_u8(&mut buf, 25, self.layer)?;
        Ok(buf)
    }
}

/// Error notification sent in reply to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPacket {
    pub header: ManagementHeader,
    /// Data sub-type of the request this refers to.
    pub data_type: u8,
    pub layer_id: u8,
    /// See the `ERR_*` constants; 255 means OK.
    pub code: u16,
    /// Message type of the request this refers to.
    pub message_type: u16,
}

impl ErrorPacket {
    pub fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        Ok(Self {
            header,
            data_type: codec::read_u8(buf, 24)?,
            layer_id: codec::read_u8(buf, 25)?,
            code: codec::read_u16_le(buf, 26)?,
            message_type: codec::read_u16_le(buf, 28)?,
        })
    }
}
