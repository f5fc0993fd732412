// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cross-packet decode tests: full datagrams through `decode_packet`.

use super::*;
use crate::protocol::constants::{HEADER_LEN, PROTOCOL_VERSION_MAJOR};
use crate::protocol::data::{METADATA_LEN, METRICS_LEN};

fn make_header(node_id: u16, message_type: u8) -> ManagementHeader {
    ManagementHeader {
        node_id,
        version_major: PROTOCOL_VERSION_MAJOR,
        version_minor: 0,
        message_type,
        node_name: "UNIT".to_string(),
        sequence: 0,
        node_type: NodeType::Master.raw(),
        node_options: 0,
        timestamp: 0,
    }
}

fn body_with_header(node_id: u16, message_type: u8, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    make_header(node_id, message_type)
        .encode_into(&mut buf)
        .expect("encode header");
    buf
}

fn put_utf16(buf: &mut [u8], offset: usize, text: &str) {
    for (i, unit) in text.encode_utf16().enumerate() {
        buf[offset + i * 2..offset + i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
}

#[test]
fn test_decode_opt_in_datagram() {
    let packet = OptInPacket {
        header: make_header(7, MessageType::OptIn.raw()),
        node_count: 1,
        listener_port: 12345,
        uptime: 10,
        vendor_name: "Test".to_string(),
        app_name: "Sim".to_string(),
        version_major: 1,
        version_minor: 0,
        version_bugfix: 0,
    };
    let bytes = packet.encode().expect("encode OptIn");

    match decode_packet(&bytes).expect("decode OptIn datagram") {
        Packet::OptIn(decoded) => {
            assert_eq!(decoded.header.node_id, 7);
            assert_eq!(decoded.listener_port, 12345);
            assert_eq!(decoded.vendor_name, "Test");
            assert_eq!(decoded.app_name, "Sim");
        }
        other => panic!("expected OptIn, got {:?}", other),
    }
}

#[test]
fn test_decode_metadata_datagram() {
    // Crafted metadata reply: artist "Artist", title "Song", key 5, id 42.
    let mut buf = body_with_header(9, MessageType::Data.raw(), METADATA_LEN);
    buf[24] = DataType::Metadata.raw();
    buf[25] = 1;
    put_utf16(&mut buf, 29, "Artist");
    put_utf16(&mut buf, 285, "Song");
    buf[541..543].copy_from_slice(&5u16.to_le_bytes());
    buf[543..547].copy_from_slice(&42u32.to_le_bytes());

    match decode_packet(&buf).expect("decode metadata datagram") {
        Packet::Data {
            payload: DataPayload::Metadata(meta),
            ..
        } => {
            assert_eq!(meta.track_artist, "Artist");
            assert_eq!(meta.track_title, "Song");
            assert_eq!(meta.track_key, 5);
            assert_eq!(meta.track_id, 42);
        }
        other => panic!("expected metadata payload, got {:?}", other),
    }
}

#[test]
fn test_decode_metrics_datagram() {
    let mut buf = body_with_header(9, MessageType::Data.raw(), METRICS_LEN);
    buf[24] = DataType::Metrics.raw();
    buf[25] = 2;
    buf[112..116].copy_from_slice(&17_400u32.to_le_bytes());

    match decode_packet(&buf).expect("decode metrics datagram") {
        Packet::Data {
            payload: DataPayload::Metrics(metrics),
            ..
        } => {
            assert_eq!(metrics.layer, 2);
            assert_eq!(metrics.bpm_hundredths, 17_400);
        }
        other => panic!("expected metrics payload, got {:?}", other),
    }
}

#[test]
fn test_decode_keyboard_records_declared_and_raw() {
    let mut buf = body_with_header(3, MessageType::Keyboard.raw(), HEADER_LEN + 6);
    // Declared size says 16, actual payload is 2 bytes; both kept as-is.
    buf[24..28].copy_from_slice(&16u32.to_le_bytes());
    buf[28] = 0x41;
    buf[29] = 0x42;

    match decode_packet(&buf).expect("decode keyboard datagram") {
        Packet::Keyboard(kb) => {
            assert_eq!(kb.declared_size, 16);
            assert_eq!(kb.data, vec![0x41, 0x42]);
        }
        other => panic!("expected keyboard, got {:?}", other),
    }
}

#[test]
fn test_decode_opaque_types_keep_body() {
    for message_type in [
        MessageType::ApplicationData,
        MessageType::Control,
        MessageType::Text,
        MessageType::File,
    ] {
        let mut buf = body_with_header(3, message_type.raw(), HEADER_LEN + 4);
        buf[24..28].copy_from_slice(&[1, 2, 3, 4]);
        match decode_packet(&buf).expect("decode opaque datagram") {
            Packet::Opaque(p) => {
                assert_eq!(p.message_type, message_type);
                assert_eq!(p.body, vec![1, 2, 3, 4]);
            }
            other => panic!("expected opaque, got {:?}", other),
        }
    }
}

#[test]
fn test_decode_unknown_message_type() {
    let buf = body_with_header(3, 77, HEADER_LEN);
    assert!(matches!(
        decode_packet(&buf),
        Err(DecodeError::Unsupported {
            message_type: 77,
            data_type: None,
        })
    ));
}

#[test]
fn test_short_datagram_is_truncated() {
    let buf = [0u8; 12];
    assert!(matches!(
        decode_packet(&buf),
        Err(DecodeError::Codec(CodecError::Truncated { .. }))
    ));
}

#[test]
fn test_right_length_bad_magic_is_bad_magic() {
    let mut buf = body_with_header(3, MessageType::OptIn.raw(), OPT_IN_LEN);
    buf[4..7].copy_from_slice(b"XYZ");
    assert!(matches!(
        decode_packet(&buf),
        Err(DecodeError::Codec(CodecError::BadMagic(_)))
    ));
}

#[test]
fn test_header_survives_all_decoders() {
    // Same header through every fixed-length decoder; node id must come
    // back identical, proving body decoding never rereads header bytes.
    let cases: &[(u8, usize)] = &[
        (MessageType::OptOut.raw(), OPT_OUT_LEN),
        (MessageType::Status.raw(), STATUS_LEN),
        (MessageType::TimeSync.raw(), TIME_SYNC_LEN),
        (MessageType::Error.raw(), ERROR_LEN),
        (MessageType::Request.raw(), REQUEST_LEN),
        (MessageType::Time.raw(), TIME_LEN),
    ];
    for &(message_type, len) in cases {
        let buf = body_with_header(0x1234, message_type, len);
        let packet = decode_packet(&buf).expect("decode datagram");
        assert_eq!(packet.header().node_id, 0x1234);
        assert_eq!(packet.header().message_type, message_type);
    }
}
