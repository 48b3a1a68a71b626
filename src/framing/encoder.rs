//! SLIP encoder
//!
//! Wraps an arbitrary payload in a delimited frame.

use bytes::BufMut;

use super::{FEND, FESC, TFEND, TFESC};

/// Encode a payload into a new frame
pub fn encode(payload: &[u8]) -> Vec<u8> {
    // Worst case every byte is escaped
    let mut frame = Vec::with_capacity(payload.len() * 2 + 2);
    encode_into(payload, &mut frame);
    frame
}

/// Append the framed payload to any byte buffer
pub fn encode_into<B: BufMut>(payload: &[u8], out: &mut B) {
    out.put_u8(FEND);
    for &byte in payload {
        match byte {
            FEND => {
                out.put_u8(FESC);
                out.put_u8(TFEND);
            }
            FESC => {
                out.put_u8(FESC);
                out.put_u8(TFESC);
            }
            _ => out.put_u8(byte),
        }
    }
    out.put_u8(FEND);
}
