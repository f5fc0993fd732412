// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end session tests over loopback.
//!
//! Each test runs its own client on a distinct broadcast port and plays the
//! peer side with a plain UDP socket, crafting the exact datagrams a media
//! player would send.

use super::*;
use crate::engine::hub::Event;
use crate::protocol::constants::{MessageType, PROTOCOL_VERSION_MAJOR};
use crate::protocol::data::{METRICS_LEN, SMALL_WAVEFORM_LEN};
use crate::protocol::{ManagementHeader, NodeType, OptInPacket, Packet};
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

fn loopback() -> NetInterface {
    NetInterface {
        name: Some("lo".to_string()),
        addr: Ipv4Addr::LOCALHOST,
        prefix_len: Some(8),
    }
}

fn test_config() -> ClientConfig {
    ClientConfig {
        node_name: "TEST".to_string(),
        vendor_name: "Test".to_string(),
        app_name: "Suite".to_string(),
        discovery_grace: Duration::from_millis(100),
        ..Default::default()
    }
}

fn connect(port: u16) -> Client {
    Client::connect_on(test_config(), loopback(), port).expect("client connect")
}

/// The peer side of a test: a bound listener socket plus packet crafting.
struct SimPeer {
    socket: UdpSocket,
    node_id: u16,
}

impl SimPeer {
    fn start(node_id: u16) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind sim peer");
        socket
            .set_read_timeout(Some(Duration::from_millis(2_000)))
            .expect("set sim peer timeout");
        Self { socket, node_id }
    }

    fn listener_port(&self) -> u16 {
        self.socket.local_addr().expect("sim peer addr").port()
    }

    fn header(&self, message_type: MessageType) -> ManagementHeader {
        ManagementHeader {
            node_id: self.node_id,
            version_major: PROTOCOL_VERSION_MAJOR,
            version_minor: 0,
            message_type: message_type.raw(),
            node_name: "SIMPEER".to_string(),
            sequence: 0,
            node_type: NodeType::Master.raw(),
            node_options: 0,
            timestamp: 0,
        }
    }

    /// Announce ourselves to the client's broadcast receiver.
    fn announce(&self, broadcast_port: u16) {
        let packet = OptInPacket {
            header: self.header(MessageType::OptIn),
            node_count: 1,
            listener_port: self.listener_port(),
            uptime: 1,
            vendor_name: "Test".to_string(),
            app_name: "Sim".to_string(),
            version_major: 1,
            version_minor: 0,
            version_bugfix: 0,
        };
        let bytes = packet.encode().expect("encode OptIn");
        self.socket
            .send_to(&bytes, ("127.0.0.1", broadcast_port))
            .expect("send OptIn");
    }

    /// Wait for one request datagram from the client.
    fn expect_request(&self) -> (u8, u8, SocketAddr) {
        let mut buf = [0u8; 256];
        let (len, from) = self.socket.recv_from(&mut buf).expect("receive request");
        match crate::protocol::decode_packet(&buf[..len]).expect("decode request") {
            Packet::Request(req) => (req.data_type, req.layer, from),
            other => panic!("expected Request, got {:?}", other),
        }
    }

    fn send_metrics(&self, to: SocketAddr, layer: u8, bpm_hundredths: u32) {
        let mut buf = vec![0u8; METRICS_LEN];
        self.header(MessageType::Data)
            .encode_into(&mut buf)
            .expect("encode header");
        buf[24] = DataType::Metrics.raw();
        buf[25] = layer;
        buf[112..116].copy_from_slice(&bpm_hundredths.to_le_bytes());
        self.socket.send_to(&buf, to).expect("send metrics");
    }

    fn send_error(&self, to: SocketAddr, data_type: u8, layer: u8, code: u16) {
        let mut buf = vec![0u8; crate::protocol::ERROR_LEN];
        self.header(MessageType::Error)
            .encode_into(&mut buf)
            .expect("encode header");
        buf[24] = data_type;
        buf[25] = layer;
        buf[26..28].copy_from_slice(&code.to_le_bytes());
        buf[28..30].copy_from_slice(&u16::from(MessageType::Request.raw()).to_le_bytes());
        self.socket.send_to(&buf, to).expect("send error");
    }

    fn send_waveform_fragment(&self, to: SocketAddr, layer: u8, total: u32, number: u32, fill: u8) {
        let mut buf = vec![0u8; SMALL_WAVEFORM_LEN];
        self.header(MessageType::Data)
            .encode_into(&mut buf)
            .expect("encode header");
        buf[24] = DataType::SmallWaveform.raw();
        buf[25] = layer;
        buf[26..30].copy_from_slice(&2400u32.to_le_bytes());
        buf[30..34].copy_from_slice(&total.to_le_bytes());
        buf[34..38].copy_from_slice(&number.to_le_bytes());
        for b in &mut buf[42..42 + 2400] {
            *b = fill;
        }
        self.socket.send_to(&buf, to).expect("send fragment");
    }
}

/// Wait until the client sees `peer` (driven by events, bounded by timeout).
fn await_peer(client: &Client, events: &Receiver<Event>, node_id: u16) {
    let deadline = Instant::now() + Duration::from_millis(2_000);
    while Instant::now() < deadline {
        if client.peers().iter().any(|p| p.node_id == node_id) {
            return;
        }
        let _ = events.recv_timeout(Duration::from_millis(50));
    }
    panic!("peer {} never appeared", node_id);
}

#[test]
fn test_handshake_opt_in_to_peer_added() {
    let client = connect(50641);
    let events = client.subscribe();

    let peer = SimPeer::start(7);
    peer.announce(50641);

    let deadline = Instant::now() + Duration::from_millis(2_000);
    let info = loop {
        match events.recv_timeout(Duration::from_millis(500)) {
            Ok(Event::PeerAdded(info)) => break info,
            Ok(_) => continue,
            Err(err) => {
                assert!(Instant::now() < deadline, "no PeerAdded event: {}", err);
            }
        }
    };

    assert_eq!(info.node_id, 7);
    assert_eq!(info.node_type, NodeType::Master);
    assert_eq!(info.vendor_name, "Test");
    assert_eq!(info.app_name, "Sim");
    assert_eq!(info.listener_port, peer.listener_port());

    let peers = client.peers();
    assert_eq!(peers.len(), 1);
    assert_eq!(peers[0].node_id, 7);

    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_without_peer_is_no_peer() {
    let client = connect(50642);
    let started = Instant::now();
    let result = client.request_data(DataType::Metrics, 2).await;
    assert_eq!(result, Err(Error::NoPeer));
    assert!(
        started.elapsed() < Duration::from_millis(200),
        "NoPeer must be immediate"
    );
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_request_times_out_on_silent_peer() {
    let client = connect(50643);
    let events = client.subscribe();
    let peer = SimPeer::start(7);
    peer.announce(50643);
    await_peer(&client, &events, 7);

    let started = Instant::now();
    let result = client
        .request_data_with_timeout(DataType::Metrics, 2, Duration::from_millis(200))
        .await;
    let elapsed = started.elapsed();

    assert_eq!(
        result,
        Err(Error::Timeout {
            node_id: 7,
            data_type: 2,
            layer: 2,
        })
    );
    assert!(elapsed >= Duration::from_millis(150), "returned too early");
    assert!(elapsed < Duration::from_millis(800), "deadline overshot");
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_metrics_request_reply() {
    let client = connect(50644);
    let events = client.subscribe();
    let peer = SimPeer::start(9);
    peer.announce(50644);
    await_peer(&client, &events, 9);

    let responder = std::thread::spawn(move || {
        let (data_type, layer, from) = peer.expect_request();
        assert_eq!(data_type, DataType::Metrics.raw());
        assert_eq!(layer, 2);
        peer.send_metrics(from, 2, 12_850);
    });

    let metrics = client.layer_metrics(2).await.expect("metrics reply");
    assert_eq!(metrics.layer, 2);
    assert_eq!(metrics.bpm_hundredths, 12_850);

    responder.join().expect("responder thread");
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_error_notification_surfaces_to_waiter() {
    let client = connect(50645);
    let events = client.subscribe();
    let peer = SimPeer::start(9);
    peer.announce(50645);
    await_peer(&client, &events, 9);

    let responder = std::thread::spawn(move || {
        let (data_type, layer, from) = peer.expect_request();
        peer.send_error(from, data_type, layer, 14);
    });

    let result = client.layer_metrics(2).await;
    assert_eq!(
        result,
        Err(Error::Remote {
            node_id: 9,
            data_type: 2,
            layer: 2,
            code: 14,
        })
    );

    responder.join().expect("responder thread");
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_requests_coalesce_on_wire() {
    let client = connect(50646);
    let events = client.subscribe();
    let peer = SimPeer::start(9);
    peer.announce(50646);
    await_peer(&client, &events, 9);

    let responder = std::thread::spawn(move || {
        let (data_type, layer, from) = peer.expect_request();
        assert_eq!(data_type, DataType::Metrics.raw());
        // Let the second caller coalesce before the reply lands.
        std::thread::sleep(Duration::from_millis(100));
        peer.send_metrics(from, layer, 17_400);

        // No second request may hit the wire.
        let mut buf = [0u8; 64];
        peer.socket
            .set_read_timeout(Some(Duration::from_millis(300)))
            .expect("set timeout");
        assert!(
            peer.socket.recv_from(&mut buf).is_err(),
            "coalesced call must not resend"
        );
    });

    let (a, b) = tokio::join!(
        client.request_data(DataType::Metrics, 2),
        client.request_data(DataType::Metrics, 2),
    );
    let a = a.expect("first caller");
    let b = b.expect("second caller");
    assert_eq!(a, b);

    responder.join().expect("responder thread");
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_waveform_fragments_reassemble_out_of_order() {
    let client = connect(50647);
    let events = client.subscribe();
    let peer = SimPeer::start(9);
    peer.announce(50647);
    await_peer(&client, &events, 9);

    let responder = std::thread::spawn(move || {
        let (data_type, layer, from) = peer.expect_request();
        assert_eq!(data_type, DataType::SmallWaveform.raw());
        // Second fragment first.
        peer.send_waveform_fragment(from, layer, 2, 1, 0xBB);
        peer.send_waveform_fragment(from, layer, 2, 0, 0xAA);
    });

    let wave = client
        .waveform(1, WaveformSize::Small)
        .await
        .expect("waveform reply");
    assert_eq!(wave.samples.len(), 4_800);
    assert!(wave.samples[..2_400].iter().all(|&b| b == 0xAA));
    assert!(wave.samples[2_400..].iter().all(|&b| b == 0xBB));

    responder.join().expect("responder thread");
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_waveform_fragment_times_out() {
    let client = connect(50648);
    let events = client.subscribe();
    let peer = SimPeer::start(9);
    peer.announce(50648);
    await_peer(&client, &events, 9);

    let responder = std::thread::spawn(move || {
        let (_, layer, from) = peer.expect_request();
        // Only one of two fragments ever arrives.
        peer.send_waveform_fragment(from, layer, 2, 0, 0xAA);
    });

    let result = client
        .request_data_with_timeout(
            DataType::SmallWaveform,
            1,
            Duration::from_millis(300),
        )
        .await;
    assert!(matches!(result, Err(Error::Timeout { .. })));

    responder.join().expect("responder thread");
    client.disconnect();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_silent_peer_evicted_then_no_peer() {
    let config = ClientConfig {
        opt_in_interval: Duration::from_millis(100),
        peer_idle_threshold: 2,
        ..test_config()
    };
    let client = Client::connect_on(config, loopback(), 50649).expect("client connect");
    let events = client.subscribe();

    let peer = SimPeer::start(7);
    peer.announce(50649);
    await_peer(&client, &events, 7);

    // One announcement, then silence past 2 x 100 ms.
    let deadline = Instant::now() + Duration::from_millis(3_000);
    let removed = loop {
        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(Event::PeerRemoved(info)) => break info,
            Ok(_) => continue,
            Err(_) => assert!(Instant::now() < deadline, "peer never evicted"),
        }
    };
    assert_eq!(removed.node_id, 7);
    assert!(client.peers().is_empty());

    let result = client.request_data(DataType::Metrics, 2).await;
    assert_eq!(result, Err(Error::NoPeer));
    client.disconnect();
}

#[test]
fn test_disconnect_closes_event_stream() {
    let client = connect(50650);
    let events = client.subscribe();
    client.disconnect();
    assert!(matches!(
        events.recv_timeout(Duration::from_millis(500)),
        Err(crossbeam::channel::RecvTimeoutError::Disconnected)
    ));
}
