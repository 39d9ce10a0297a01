//! End-to-end decode test: a captured NETLINK frame, hex-encoded one per
//! line (the same format a `tcpdump`-style capture of the audit socket
//! would produce), decoded through this crate's own wire types --
//! `transport::decode_frame`, `parser::parse_header`, and
//! `assembler::Assembler` -- rather than a generic NETLINK crate.

use std::sync::Arc;

use auditrs::assembler::Assembler;
use auditrs::parser::parse_header;
use auditrs::transport::decode_frame;
use auditrs::uid_cache::UidCache;

const EOE_TYPE: u16 = 1320;
const SYSCALL_TYPE: u16 = 1300;
const PATH_TYPE: u16 = 1302;

/// Builds one NLMSG frame (16-byte header + payload), matching the shape
/// `transport::netlink::receive` strips off a live socket read.
fn encode_frame(msg_type: u16, seq: u32, payload: &str) -> Vec<u8> {
    let payload = payload.as_bytes();
    let mut buf = Vec::with_capacity(16 + payload.len());
    buf.extend_from_slice(&((16 + payload.len()) as u32).to_le_bytes());
    buf.extend_from_slice(&msg_type.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes());
    buf.extend_from_slice(&seq.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).expect("valid hex"))
        .collect()
}

/// A small captured source log: one SYSCALL+PATH+EOE event at sequence 7,
/// each line a hex-encoded frame.
fn fixture_lines() -> Vec<String> {
    vec![
        hex_encode(&encode_frame(SYSCALL_TYPE, 7, "audit(10000001.123:7): uid=0 syscall=59")),
        hex_encode(&encode_frame(PATH_TYPE, 7, "audit(10000001.123:7): name=\"/bin/ls\"")),
        hex_encode(&encode_frame(EOE_TYPE, 7, "audit(10000001.123:7): ")),
    ]
}

#[test]
fn fixture_lines_are_valid_hex() {
    for line in fixture_lines() {
        let decoded = hex_decode(&line);
        assert!(!decoded.is_empty());
    }
}

#[test]
fn fixture_lines_decode_to_expected_record_types() {
    let expected = [SYSCALL_TYPE, PATH_TYPE, EOE_TYPE];
    for (line, expected_type) in fixture_lines().into_iter().zip(expected) {
        let bytes = hex_decode(&line);
        let frame = decode_frame(&bytes).expect("frame should decode");
        assert_eq!(frame.record_type, expected_type);
    }
}

#[test]
fn captured_frames_assemble_into_one_complete_event() {
    let mut assembler = Assembler::new(Arc::new(UidCache::new()), None, 1300, 1399);

    let mut completed = Vec::new();
    for line in fixture_lines() {
        let bytes = hex_decode(&line);
        let frame = decode_frame(&bytes).expect("frame should decode");
        let payload = String::from_utf8(frame.payload).expect("payload is utf8");
        let (header, rest) = parse_header(&payload);
        completed.extend(assembler.process(frame.record_type, header.sequence, header.timestamp, rest));
    }

    assert_eq!(completed.len(), 1);
    let group = &completed[0];
    assert_eq!(group.sequence, 7);
    assert_eq!(group.messages.len(), 2);
    assert_eq!(group.messages[0].type_num(), SYSCALL_TYPE);
    assert_eq!(group.messages[1].type_num(), PATH_TYPE);
    assert_eq!(group.syscall_id.as_deref(), Some("59"));
}

#[test]
fn truncated_frame_is_rejected_without_panicking() {
    assert!(decode_frame(&[0u8; 4]).is_err());
}
