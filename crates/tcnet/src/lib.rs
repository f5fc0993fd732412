// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tcnet - TCNet client library
//!
//! A pure Rust client for TCNet, the UDP broadcast protocol professional DJ
//! gear (mixers, media players) uses to expose real-time playback state,
//! track metadata, waveforms, cue points and mixer state to the network.
//!
//! The client joins the segment's node-discovery handshake, tracks live
//! peers, and offers typed request/response queries over unicast on top of
//! the stateless datagram exchange.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tcnet::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect(ClientConfig::default())?;
//!
//!     let info = client.track_info(1).await?;
//!     println!("{} - {}", info.track_artist, info.track_title);
//!
//!     let metrics = client.layer_metrics(1).await?;
//!     println!("{:.2} BPM at {} ms", metrics.bpm(), metrics.current_position_ms);
//!
//!     client.disconnect();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                        Client facade                          |
//! |  connect/disconnect | track_info | layer_metrics | waveform   |
//! +---------------------------------------------------------------+
//! |   Peer registry    |  Pending table   |      Event hub        |
//! |  (OptIn/lease)     | (request <-> reply) |  (lossy fan-out)   |
//! +---------------------------------------------------------------+
//! |                     Packet codec (protocol)                   |
//! |   24-byte header | fixed-offset LE layouts | tagged Packet    |
//! +---------------------------------------------------------------+
//! |                     UDP transport (3 sockets)                 |
//! |   broadcast rx :60000 | broadcast tx | unicast (advertised)   |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Connected session; all queries go through it |
//! | [`ClientConfig`] | Interface, identity and timing options |
//! | [`Event`] | Decoded packets and peer lifecycle notifications |
//! | [`PeerInfo`] | A live peer with its unicast request endpoint |
//! | [`Packet`] | Any decoded TCNet datagram, tagged by message type |
//!
//! Logging goes through the `log` facade; bring your own logger
//! (`env_logger` works well for the examples).

/// Client configuration and timing defaults.
pub mod config;
/// Peer discovery: registry, keep-alive announcer, idle eviction.
pub mod discovery;
/// Receive loops, dispatch, event hub and request correlation.
pub mod engine;
/// Error taxonomy for client operations.
pub mod error;
/// Wire protocol: packet layouts, decode dispatch, encoders.
pub mod protocol;
/// The three-socket UDP transport and interface selection.
pub mod transport;

/// Session facade.
pub mod client;

pub use client::Client;
pub use config::ClientConfig;
pub use discovery::{PeerInfo, PeerRegistry};
pub use engine::hub::Event;
pub use engine::pending::ReplyData;
pub use error::{Error, Result};
pub use protocol::data::{
    Cue, CueColor, CueData, LayerMetrics, MixerChannel, MixerData, TrackMetadata, WaveformData,
    WaveformPoint, WaveformSize,
};
pub use protocol::{
    DataType, ManagementHeader, MessageType, NodeType, Packet, StatusPacket, TimePacket,
    Timecode, TimecodeState,
};

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
