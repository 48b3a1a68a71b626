//! SLIP Framing Tests
//!
//! Tests for frame encoding, incremental decoding and resynchronisation.

use nspwheel::framing::{decode_frame, encode, SlipDecoder, FEND, FESC, TFEND, TFESC};
use nspwheel::WheelError;

// =============================================================================
// Helper Functions
// =============================================================================

/// Feed bytes one at a time and collect completed payloads
fn decode_all(decoder: &mut SlipDecoder, bytes: &[u8]) -> Vec<Vec<u8>> {
    bytes
        .iter()
        .filter_map(|&b| decoder.push(b).unwrap())
        .map(|frame| frame.to_vec())
        .collect()
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_plain_payload() {
    assert_eq!(encode(&[0x20, 0x11, 0x80]), vec![FEND, 0x20, 0x11, 0x80, FEND]);
}

#[test]
fn test_encode_escapes_reserved_bytes() {
    let frame = encode(&[FEND, 0x01, FESC]);
    assert_eq!(frame, vec![FEND, FESC, TFEND, 0x01, FESC, TFESC, FEND]);
}

#[test]
fn test_encode_empty_payload() {
    assert_eq!(encode(&[]), vec![FEND, FEND]);
}

#[test]
fn test_encoded_body_never_contains_fend() {
    let payload: Vec<u8> = (0..=255).collect();
    let frame = encode(&payload);
    let body = &frame[1..frame.len() - 1];
    assert!(!body.contains(&FEND));
}

#[test]
fn test_escape_tokens_pass_through_unescaped() {
    // TFEND/TFESC are only special after FESC
    let frame = encode(&[TFEND, TFESC]);
    assert_eq!(frame, vec![FEND, TFEND, TFESC, FEND]);
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_roundtrip_all_byte_values() {
    let payload: Vec<u8> = (0..=255).collect();
    assert_eq!(decode_frame(&encode(&payload)).unwrap(), payload);
}

#[test]
fn test_roundtrip_runs_of_reserved_bytes() {
    let payloads: Vec<Vec<u8>> = vec![
        vec![FEND; 16],
        vec![FESC; 16],
        vec![FESC, FEND, FESC, FEND],
        vec![FESC, TFEND, FESC, TFESC],
        vec![0x00],
    ];
    for payload in payloads {
        assert_eq!(decode_frame(&encode(&payload)).unwrap(), payload);
    }
}

#[test]
fn test_roundtrip_pseudo_random_payloads() {
    // xorshift so the sequence is repeatable
    let mut state: u32 = 0x1234_5678;
    for len in 1..64 {
        let payload: Vec<u8> = (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();
        let mut decoder = SlipDecoder::new();
        let frames = decode_all(&mut decoder, &encode(&payload));
        assert_eq!(frames, vec![payload]);
    }
}

// =============================================================================
// Incremental Decoding Tests
// =============================================================================

#[test]
fn test_decoder_needs_more_data_until_fend() {
    let mut decoder = SlipDecoder::new();
    assert!(decoder.push(FEND).unwrap().is_none());
    assert!(decoder.push(0x01).unwrap().is_none());
    assert!(decoder.push(0x02).unwrap().is_none());
    assert_eq!(decoder.pending_len(), 2);

    let frame = decoder.push(FEND).unwrap().unwrap();
    assert_eq!(&frame[..], &[0x01, 0x02]);
    assert_eq!(decoder.pending_len(), 0);
}

#[test]
fn test_decoder_discards_empty_frames() {
    let mut decoder = SlipDecoder::new();
    let stream = [FEND, FEND, FEND, FEND, 0x42, FEND, FEND];
    assert_eq!(decode_all(&mut decoder, &stream), vec![vec![0x42]]);
}

#[test]
fn test_decoder_yields_back_to_back_frames() {
    let mut stream = encode(&[0x01, 0x02]);
    stream.extend(encode(&[FEND]));
    stream.extend(encode(&[0x03]));

    let mut decoder = SlipDecoder::new();
    let frames = decode_all(&mut decoder, &stream);
    assert_eq!(frames, vec![vec![0x01, 0x02], vec![FEND], vec![0x03]]);
}

#[test]
fn test_decoder_shared_delimiter() {
    // One FEND may close a frame and open the next
    let stream = [FEND, 0x01, FEND, 0x02, FEND];
    let mut decoder = SlipDecoder::new();
    assert_eq!(decode_all(&mut decoder, &stream), vec![vec![0x01], vec![0x02]]);
}

#[test]
fn test_decoder_escape_split_across_chunks() {
    let mut decoder = SlipDecoder::new();
    let first = decoder.push_slice(&[FEND, 0x10, FESC]);
    assert!(first.is_empty());
    let second = decoder.push_slice(&[TFEND, FEND]);
    assert_eq!(second.len(), 1);
    assert_eq!(&second[0].as_ref().unwrap()[..], &[0x10, FEND]);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_invalid_escape_is_framing_error() {
    let mut decoder = SlipDecoder::new();
    decoder.push(FEND).unwrap();
    decoder.push(0x01).unwrap();
    decoder.push(FESC).unwrap();
    let err = decoder.push(0x99).unwrap_err();
    assert!(matches!(err, WheelError::Framing(0x99)));
}

#[test]
fn test_decoder_recovers_after_framing_error() {
    let mut stream = vec![FEND, 0x01, FESC, 0x00, 0x02, 0x03];
    stream.extend(encode(&[0xAA, 0xBB]));

    let mut decoder = SlipDecoder::new();
    let results = decoder.push_slice(&stream);

    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(WheelError::Framing(0x00))));
    assert_eq!(&results[1].as_ref().unwrap()[..], &[0xAA, 0xBB]);
}

#[test]
fn test_escape_followed_by_fend_is_error_then_resync() {
    let mut decoder = SlipDecoder::new();
    let results = decoder.push_slice(&[FEND, 0x01, FESC, FEND, 0x05, FEND]);
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(WheelError::Framing(FEND))));
    assert_eq!(&results[1].as_ref().unwrap()[..], &[0x05]);
}

#[test]
fn test_reset_drops_partial_frame() {
    let mut decoder = SlipDecoder::new();
    decoder.push_slice(&[FEND, 0x01, 0x02]);
    decoder.reset();
    assert_eq!(decoder.pending_len(), 0);
    assert_eq!(decode_all(&mut decoder, &[0x03, FEND]), vec![vec![0x03]]);
}

// =============================================================================
// One-shot Decoding Tests
// =============================================================================

#[test]
fn test_decode_frame_without_delimiters() {
    assert_eq!(decode_frame(&[0x01, FESC, TFESC]).unwrap(), vec![0x01, FESC]);
}

#[test]
fn test_decode_frame_empty_is_error() {
    assert!(decode_frame(&[FEND, FEND]).is_err());
    assert!(decode_frame(&[]).is_err());
}

#[test]
fn test_decode_frame_rejects_two_frames() {
    let mut stream = encode(&[0x01]);
    stream.extend(encode(&[0x02]));
    assert!(matches!(
        decode_frame(&stream),
        Err(WheelError::MalformedPacket(_))
    ));
}
