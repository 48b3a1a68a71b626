//! Integrity Engine
//!
//! CRC-16 over NSP packet bytes (ICD §5.7).
//!
//! The ICD's reference routine runs the CCITT polynomial 0x1021 LSB-first
//! (reflected constant 0x8408), starts the register at 0xFFFF and applies no
//! final XOR, which is the catalogued CRC-16/MCRF4XX. The result is appended
//! to the packet low byte first.
//!
//! Known vectors:
//! - `b"123456789"` → `0x6F91`
//! - PING `[0x20, 0x11, 0x80]` → `0x3249`

use ::crc::{Crc, Digest, CRC_16_MCRF4XX};

/// CCITT generator polynomial, normal form
pub const POLYNOMIAL: u16 = 0x1021;

/// Initial register value
pub const INITIAL: u16 = 0xFFFF;

/// Width of the appended checksum in bytes
pub const CHECKSUM_SIZE: usize = 2;

static NSP_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// Running CRC-16 state, for checksumming a packet in pieces
#[derive(Clone)]
pub struct Crc16 {
    digest: Digest<'static, u16>,
}

impl Crc16 {
    pub fn new() -> Self {
        Self {
            digest: NSP_CRC.digest(),
        }
    }

    /// Feed more bytes into the register
    pub fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the checksum of a complete byte sequence
pub fn checksum(bytes: &[u8]) -> u16 {
    NSP_CRC.checksum(bytes)
}

/// Checksum in wire order (least-significant byte first)
pub fn checksum_bytes(bytes: &[u8]) -> [u8; CHECKSUM_SIZE] {
    checksum(bytes).to_le_bytes()
}

/// Verify a byte sequence whose last two bytes are its checksum
///
/// Returns `(received, computed)` on mismatch.
pub fn verify(packet: &[u8]) -> Result<(), (u16, u16)> {
    let Some(split) = packet.len().checked_sub(CHECKSUM_SIZE) else {
        return Err((0, checksum(packet)));
    };
    let (body, tail) = packet.split_at(split);
    let received = u16::from_le_bytes([tail[0], tail[1]]);
    let computed = checksum(body);
    if received == computed {
        Ok(())
    } else {
        Err((received, computed))
    }
}
