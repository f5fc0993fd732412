// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! OptIn / OptOut announcements.
//!
//! OptIn is the protocol's keep-alive: every node broadcasts one when it
//! joins the segment and then periodically. It carries the unicast listener
//! port peers must use for requests, plus vendor/application identity.
//! OptOut announces a clean departure.
//!
//! # OptIn wire format (68 bytes)
//!
//! ```text
//! offset  size  field
//! 24      2     node count (u16 LE)
//! 26      2     listener port (u16 LE)
//! 28      2     uptime (u16 LE)
//! 32      16    vendor name (ASCII, NUL-padded)
//! 48      16    application name (ASCII, NUL-padded)
//! 64      1     application version major
//! 65      1     application version minor
//! 66      1     application version bugfix
//! ```
//!
//! # OptOut wire format (28 bytes)
//!
//! ```text
//! 24      2     node count (u16 LE)
//! 26      2     listener port (u16 LE)
//! ```

use super::codec::{self, CodecResult};
use super::header::ManagementHeader;
use super::constants::VENDOR_NAME_LEN;

/// Fixed OptIn datagram length.
pub const OPT_IN_LEN: usize = 68;

/// Fixed OptOut datagram length.
pub const OPT_OUT_LEN: usize = 28;

/// Node join / keep-alive announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptInPacket {
    pub header: ManagementHeader,
    /// Number of nodes the sender knows about (itself included).
    pub node_count: u16,
    /// Unicast port the sender accepts requests on.
    pub listener_port: u16,
    pub uptime: u16,
    pub vendor_name: String,
    pub app_name: String,
    pub version_major: u8,
    pub version_minor: u8,
    pub version_bugfix: u8,
}

impl OptInPacket {
    pub fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        Ok(Self {
            header,
            node_count: codec::read_u16_le(buf, 24)?,
            listener_port: codec::read_u16_le(buf, 26)?,
            uptime: codec::read_u16_le(buf, 28)?,
            vendor_name: codec::read_ascii(buf, 32, VENDOR_NAME_LEN)?,
            app_name: codec::read_ascii(buf, 48, VENDOR_NAME_LEN)?,
            version_major: codec::read_u8(buf, 64)?,
            version_minor: codec::read_u8(buf, 65)?,
            version_bugfix: codec::read_u8(buf, 66)?,
        })
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; OPT_IN_LEN];
        self.header.encode_into(&mut buf)?;
        codec::write_u16_le(&mut buf, 24, self.node_count)?;
        codec::write_u16_le(&mut buf, 26, self.listener_port)?;
        codec::write_u16_le(&mut buf, 28, self.uptime)?;
        codec::write_ascii(&mut buf, 32, VENDOR_NAME_LEN, &self.vendor_name)?;
        codec::write_ascii(&mut buf, 48, VENDOR_NAME_LEN, &self.app_name)?;
        codec::write_u8(&mut buf, 64, self.version_major)?;
        codec::write_u8(&mut buf, 65, self.version_minor)?;
        codec::write_u8(&mut buf, 66, self.version_bugfix)?;
        Ok(buf)
    }
}

/// Node departure announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptOutPacket {
    pub header: ManagementHeader,
    pub node_count: u16,
    pub listener_port: u16,
}

impl OptOutPacket {
    pub fn decode(buf: &[u8], header: ManagementHeader) -> CodecResult<Self> {
        Ok(Self {
            header,
            node_count: codec::read_u16_le(buf, 24)?,
            listener_port: codec::read_u16_le(buf, 26)?,
        })
    }

    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut buf = vec![0u8; OPT_OUT_LEN];
        self.header.encode_into(&mut buf)?;
        codec::write_u16_le(&mut buf, 24, self.node_count)?;
        codec::write_u16_le(&mut buf, 26, self.listener_port)?;
        Ok(buf)
    }
}
