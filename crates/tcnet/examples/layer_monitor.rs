// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Print track info and live metrics for one layer, once a second.
//!
//! ```text
//! cargo run --example layer_monitor [layer]
//! RUST_LOG=tcnet=debug cargo run --example layer_monitor 2
//! ```

use std::time::Duration;
use tcnet::{Client, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let layer: u8 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(1);

    println!("Connecting...");
    let client = Client::connect(ClientConfig::default())?;

    match client.peers().first() {
        Some(peer) => println!(
            "Talking to node {} '{}' ({} / {})",
            peer.node_id, peer.node_name, peer.vendor_name, peer.app_name
        ),
        None => println!("No peers yet; waiting for the first announcement..."),
    }

    loop {
        match client.track_info(layer).await {
            Ok(info) => println!(
                "layer {}: {} - {} (key {}, id {})",
                layer, info.track_artist, info.track_title, info.track_key, info.track_id
            ),
            Err(err) => println!("layer {}: track info unavailable: {}", layer, err),
        }

        match client.layer_metrics(layer).await {
            Ok(m) => println!(
                "  {:.2} BPM, beat {}, {} / {} ms",
                m.bpm(),
                m.beat_number,
                m.current_position_ms,
                m.track_length_ms
            ),
            Err(err) => println!("  metrics unavailable: {}", err),
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
