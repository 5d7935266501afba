//! Property-based tests for frame encoding and decoding.
//!
//! These tests use proptest to fuzz the frame codec and find edge cases in
//! the length encoding, masking, and the 16-bit payload ceiling.

use proptest::prelude::*;
use rewsock::protocol::{Frame, MAX_PAYLOAD_LEN, OpCode, apply_mask};
use rewsock::Error;

/// Strategy for generating valid data frame opcodes.
fn data_opcode_strategy() -> impl Strategy<Value = OpCode> {
    prop_oneof![
        Just(OpCode::Text),
        Just(OpCode::Binary),
        Just(OpCode::Continuation),
    ]
}

fn any_opcode_strategy() -> impl Strategy<Value = OpCode> {
    prop_oneof![
        Just(OpCode::Continuation),
        Just(OpCode::Text),
        Just(OpCode::Binary),
        Just(OpCode::Close),
        Just(OpCode::Ping),
        Just(OpCode::Pong),
    ]
}

proptest! {
    // =========================================================================
    // Property 1: Roundtrip - parse(write(frame)) == frame (unmasked)
    // =========================================================================
    #[test]
    fn test_roundtrip_unmasked(
        fin in any::<bool>(),
        opcode in data_opcode_strategy(),
        payload in prop::collection::vec(any::<u8>(), 0..1000)
    ) {
        let frame = Frame::new(fin, opcode, payload.clone());
        let mut buf = vec![0u8; frame.wire_size(false)];
        let written = frame.write(&mut buf, None);
        prop_assert!(written.is_ok(), "write failed: {:?}", written);
        let written = written.unwrap();

        let parsed = Frame::parse(&buf[..written]);
        prop_assert!(parsed.is_ok(), "parse failed: {:?}", parsed);
        let (parsed, consumed) = parsed.unwrap();

        prop_assert_eq!(consumed, written);
        prop_assert_eq!(frame.fin, parsed.fin);
        prop_assert_eq!(frame.opcode, parsed.opcode);
        prop_assert_eq!(frame.payload(), parsed.payload());
    }

    // =========================================================================
    // Property 2: Roundtrip with masking
    // =========================================================================
    #[test]
    fn test_roundtrip_masked(
        fin in any::<bool>(),
        opcode in any_opcode_strategy(),
        payload in prop::collection::vec(any::<u8>(), 0..500),
        mask in any::<[u8; 4]>()
    ) {
        let frame = Frame::new(fin, opcode, payload.clone());
        let mut buf = vec![0u8; frame.wire_size(true)];
        let written = frame.write(&mut buf, Some(mask));
        prop_assert!(written.is_ok(), "write failed: {:?}", written);
        let written = written.unwrap();

        let parsed = Frame::parse(&buf[..written]);
        prop_assert!(parsed.is_ok(), "parse failed: {:?}", parsed);
        let (parsed, _) = parsed.unwrap();

        // After parsing, the payload must be unmasked and match the original.
        prop_assert_eq!(frame.payload(), parsed.payload());
        prop_assert_eq!(frame.fin, parsed.fin);
        prop_assert_eq!(frame.opcode, parsed.opcode);
    }

    // =========================================================================
    // Property 3: Masking is reversible (XOR is self-inverse)
    // =========================================================================
    #[test]
    fn test_mask_reversible(
        data in prop::collection::vec(any::<u8>(), 0..2000),
        mask in any::<[u8; 4]>()
    ) {
        let mut masked = data.clone();
        apply_mask(&mut masked, mask);
        apply_mask(&mut masked, mask);
        prop_assert_eq!(data, masked);
    }

    // =========================================================================
    // Property 4: Masking with a nonzero key changes a nonzero payload
    // =========================================================================
    #[test]
    fn test_mask_changes_payload(
        data in prop::collection::vec(1u8..=255, 1..500),
    ) {
        // A key with every byte nonzero flips every payload byte.
        let mask = [0xAA, 0xBB, 0xCC, 0xDD];
        let mut masked = data.clone();
        apply_mask(&mut masked, mask);
        prop_assert_ne!(data, masked);
    }

    // =========================================================================
    // Property 5: Length encoding picks the right form for all sizes <= 65535
    // =========================================================================
    #[test]
    fn test_payload_length_encoding(
        payload_len in 0usize..=MAX_PAYLOAD_LEN
    ) {
        let frame = Frame::new(true, OpCode::Binary, vec![0x42; payload_len]);
        let mut buf = vec![0u8; frame.wire_size(false)];
        let written = frame.write(&mut buf, None).unwrap();

        // The 7-bit form for < 126, the 16-bit extended form otherwise.
        if payload_len < 126 {
            prop_assert_eq!(buf[1] & 0x7F, payload_len as u8);
            prop_assert_eq!(written, 2 + payload_len);
        } else {
            prop_assert_eq!(buf[1] & 0x7F, 126);
            prop_assert_eq!(
                u16::from_be_bytes([buf[2], buf[3]]) as usize,
                payload_len
            );
            prop_assert_eq!(written, 4 + payload_len);
        }

        let (parsed, consumed) = Frame::parse(&buf[..written]).unwrap();
        prop_assert_eq!(consumed, written);
        prop_assert_eq!(parsed.payload().len(), payload_len);
    }

    // =========================================================================
    // Property 6: Payloads beyond 65535 bytes never encode
    // =========================================================================
    #[test]
    fn test_oversized_payload_rejected(
        extra in 1usize..1000
    ) {
        let frame = Frame::new(true, OpCode::Binary, vec![0; MAX_PAYLOAD_LEN + extra]);
        let mut buf = vec![0u8; MAX_PAYLOAD_LEN + extra + 16];
        let result = frame.write(&mut buf, None);
        prop_assert!(
            matches!(result, Err(Error::UnsupportedFrameLength(_))),
            "oversized write must fail: {:?}",
            result
        );
    }

    // =========================================================================
    // Property 7: The 64-bit length marker is always rejected
    // =========================================================================
    #[test]
    fn test_64bit_length_marker_rejected(
        fin in any::<bool>(),
        opcode in any_opcode_strategy(),
        declared_len in any::<u64>()
    ) {
        let first = if fin { 0x80 } else { 0x00 } | opcode.as_u8();
        let mut wire = vec![first, 127];
        wire.extend_from_slice(&declared_len.to_be_bytes());

        let result = Frame::parse(&wire);
        prop_assert!(
            matches!(result, Err(Error::UnsupportedFrameLength(_))),
            "64-bit length form must be rejected: {:?}",
            result
        );
    }

    // =========================================================================
    // Property 8: Truncated frames report how many bytes are missing
    // =========================================================================
    #[test]
    fn test_truncated_frame_is_incomplete(
        payload in prop::collection::vec(any::<u8>(), 1..300),
        cut in any::<prop::sample::Index>()
    ) {
        let frame = Frame::new(true, OpCode::Binary, payload);
        let mut buf = vec![0u8; frame.wire_size(false)];
        let written = frame.write(&mut buf, None).unwrap();

        let cut = cut.index(written); // 0 <= cut < written
        let result = Frame::parse(&buf[..cut]);
        prop_assert!(
            matches!(result, Err(Error::IncompleteFrame { .. })),
            "truncated parse must be incomplete: {:?}",
            result
        );
    }
}
