// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Watch the segment: print peers as they come and go for 30 seconds.
//!
//! ```text
//! cargo run --example peer_dump
//! ```

use std::time::{Duration, Instant};
use tcnet::{Client, ClientConfig, Event};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let client = Client::connect(ClientConfig::default())?;
    let events = client.subscribe();
    println!(
        "Listening as node {} (unicast port {})",
        client.node_id(),
        client.listener_port()
    );

    for peer in client.peers() {
        println!(
            "  peer {:5}  {:8}  {}:{}  {} / {}",
            peer.node_id,
            peer.node_name,
            peer.remote_ip,
            peer.listener_port,
            peer.vendor_name,
            peer.app_name
        );
    }

    let deadline = Instant::now() + Duration::from_secs(30);
    while Instant::now() < deadline {
        match events.recv_timeout(Duration::from_millis(500)) {
            Ok(Event::PeerAdded(peer)) => println!(
                "+ peer {:5}  {:8}  {}:{}  {} / {}",
                peer.node_id,
                peer.node_name,
                peer.remote_ip,
                peer.listener_port,
                peer.vendor_name,
                peer.app_name
            ),
            Ok(Event::PeerRemoved(peer)) => {
                println!("- peer {:5}  {:8}", peer.node_id, peer.node_name)
            }
            Ok(_) => {}
            Err(_) => {}
        }
    }

    client.disconnect();
    Ok(())
}
