// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Management header: the 24-byte prefix of every TCNet datagram.
//!
//! # Wire format
//!
//! ```text
//! offset  size  field
//! 0       2     node id (u16 LE)
//! 2       1     protocol major version (must be 3)
//! 3       1     protocol minor version
//! 4       3     magic "TCN"
//! 7       1     message type
//! 8       8     node name (ASCII, NUL-padded)
//! 16      1     sequence
//! 17      1     node type
//! 18      2     node options (u16 LE)
//! 20      4     timestamp (u32 LE, ms since sender's local epoch)
//! ```
//!
//! `decode` validates magic and major version before anything else looks at
//! the body; all body offsets in the packet modules are absolute (header at
//! 0, body from 24).

use super::codec::{self, CodecError, CodecResult};
use super::constants::{NODE_NAME_LEN, PROTOCOL_VERSION_MAJOR, TCNET_MAGIC};

/// Decoded management header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementHeader {
    /// Sender's node id; keys the peer registry.
    pub node_id: u16,
    pub version_major: u8,
    pub version_minor: u8,
    /// Raw message type byte; see `MessageType::from_raw`.
    pub message_type: u8,
    pub node_name: String,
    /// Wrapping per-sender sequence counter.
    pub sequence: u8,
    /// Raw node type byte; see `NodeType::from_raw`.
    pub node_type: u8,
    pub node_options: u16,
    /// Milliseconds since the sender's local epoch.
    pub timestamp: u32,
}

impl ManagementHeader {
    /// Decode and validate a header from the front of `buf`.
    ///
    /// Fails with `Truncated` on a short buffer, `BadMagic` / `BadVersion`
    /// when the frame is not a supported TCNet datagram.
    pub fn decode(buf: &[u8]) -> CodecResult<Self> {
        let magic = codec::read_bytes(buf, 4, 3)?;
        if magic != TCNET_MAGIC {
            return Err(CodecError::BadMagic([magic[0], magic[1], magic[2]]));
        }
        let version_major = codec::read_u8(buf, 2)?;
        if version_major != PROTOCOL_VERSION_MAJOR {
            return Err(CodecError::BadVersion(version_major));
        }

        Ok(Self {
            node_id: codec::read_u16_le(buf, 0)?,
            version_major,
            version_minor: codec::read_u8(buf, 3)?,
            message_type: codec::read_u8(buf, 7)?,
            node_name: codec::read_ascii(buf, 8, NODE_NAME_LEN)?,
            sequence: codec::read_u8(buf, 16)?,
            node_type: codec::read_u8(buf, 17)?,
            node_options: codec::read_u16_le(buf, 18)?,
            timestamp: codec::read_u32_le(buf, 20)?,
        })
    }

    /// Encode this header into the first 24 bytes of `buf`.
    pub fn encode_into(&self, buf: &mut [u8]) -> CodecResult<()> {
        codec::write_u16_le(buf, 0, self.node_id)?;
        codec::write_u8(buf, 2, self.version_major)?;
        codec::write_u8(buf, 3, self.version_minor)?;
        for (i, b) in TCNET_MAGIC.iter().enumerate() {
            codec::write_u8(buf, 4 + i, *b)?;
        }
        codec::write_u8(buf, 7, self.message_type)?;
        codec::write_ascii(buf, 8, NODE_NAME_LEN, &self.node_name)?;
        codec::write_u8(buf, 16, self.sequence)?;
        codec::write_u8(buf, 17, self.node_type)?;
        codec::write_u16_le(buf, 18, self.node_options)?;
        codec::write_u32_le(buf, 20, self.timestamp)?;
        Ok(())
    }
}
