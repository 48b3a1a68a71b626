//! CRC-16 Tests
//!
//! Known vectors and error-detection properties of the packet checksum.

use nspwheel::crc::{checksum, checksum_bytes, verify, Crc16, CHECKSUM_SIZE};

// =============================================================================
// Known Vectors
// =============================================================================

#[test]
fn test_check_string_vector() {
    assert_eq!(checksum(b"123456789"), 0x6F91);
}

#[test]
fn test_ping_packet_vector() {
    assert_eq!(checksum(&[0x20, 0x11, 0x80]), 0x3249);
    assert_eq!(checksum_bytes(&[0x20, 0x11, 0x80]), [0x49, 0x32]);
}

#[test]
fn test_matches_catalog_algorithm() {
    let catalog = crc::Crc::<u16>::new(&crc::CRC_16_MCRF4XX);
    let inputs: [&[u8]; 4] = [b"123456789", &[0x20, 0x11, 0x80], &[], &[0xC0; 64]];
    for input in inputs {
        assert_eq!(checksum(input), catalog.checksum(input));
    }
}

#[test]
fn test_empty_input_is_initial_register() {
    assert_eq!(checksum(&[]), 0xFFFF);
}

#[test]
fn test_incremental_matches_one_shot() {
    let data: Vec<u8> = (0..200u8).collect();
    for split in [0, 1, 3, 100, 199, 200] {
        let mut crc = Crc16::new();
        crc.update(&data[..split]);
        crc.update(&data[split..]);
        assert_eq!(crc.finalize(), checksum(&data), "split at {}", split);
    }
}

// =============================================================================
// Verification
// =============================================================================

#[test]
fn test_verify_accepts_appended_checksum() {
    let mut packet = vec![0x20, 0x11, 0x81, 0x00, 0x00, 0x05, 0x20];
    packet.extend_from_slice(&checksum_bytes(&packet));
    assert!(verify(&packet).is_ok());
}

#[test]
fn test_verify_reports_both_values() {
    let packet = [0x20, 0x11, 0x80, 0x00, 0x00];
    let (received, computed) = verify(&packet).unwrap_err();
    assert_eq!(received, 0x0000);
    assert_eq!(computed, 0x3249);
}

#[test]
fn test_verify_short_input_fails() {
    assert!(verify(&[0x01]).is_err());
    assert!(verify(&[]).is_err());
}

// =============================================================================
// Error Detection
// =============================================================================

#[test]
fn test_every_single_bit_flip_detected() {
    let mut packet = b"\x20\x11\x88\x15payload".to_vec();
    packet.extend_from_slice(&checksum_bytes(&packet));

    for index in 0..packet.len() {
        for bit in 0..8 {
            let mut corrupted = packet.clone();
            corrupted[index] ^= 1 << bit;
            assert!(
                verify(&corrupted).is_err(),
                "flip of bit {} in byte {} went unnoticed",
                bit,
                index
            );
        }
    }
}

#[test]
fn test_adjacent_double_bit_flips_detected() {
    let mut packet = vec![0x20, 0x11, 0x87, 0x15];
    packet.extend_from_slice(&checksum_bytes(&packet));
    let bits = packet.len() * 8;

    for first in 0..bits - 1 {
        let mut corrupted = packet.clone();
        for bit in [first, first + 1] {
            corrupted[bit / 8] ^= 1 << (bit % 8);
        }
        assert!(verify(&corrupted).is_err(), "burst at bit {}", first);
    }
}

#[test]
fn test_checksum_width() {
    assert_eq!(CHECKSUM_SIZE, 2);
}
