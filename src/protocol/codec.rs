//! Packet codec
//!
//! Encoding and decoding of NSP packets and their typed payload fields.
//!
//! ## Wire Format
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────────────┬─────────────┐
//! │ Dest (1) │ Src (1)  │ Ctrl (1) │  Payload (0..N)   │ CRC (2, LE) │
//! └──────────┴──────────┴──────────┴───────────────────┴─────────────┘
//! ```
//!
//! The CRC covers every byte before it. On decode the checksum is verified
//! before any field is interpreted.

use bytes::{Buf, BufMut, Bytes};

use super::{Control, FieldKind, Packet, Value};
use crate::crc::{self, Crc16, CHECKSUM_SIZE};
use crate::error::{Result, WheelError};

/// Header size: dest (1) + src (1) + control (1)
pub const HEADER_SIZE: usize = 3;

/// Smallest valid packet: header + checksum
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Default bound on payload size (bytes)
pub const MAX_PAYLOAD_SIZE: usize = 1024;

// =============================================================================
// Packet Encoding/Decoding
// =============================================================================

/// Encode a packet to bytes
///
/// Format: dest (1) + src (1) + control (1) + payload + crc (2)
pub fn encode_packet(dest: u8, src: u8, control: Control, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(MIN_PACKET_SIZE + payload.len());
    message.put_u8(dest);
    message.put_u8(src);
    message.put_u8(control.to_byte());
    message.put_slice(payload);

    let crc = crc::checksum(&message);
    message.put_u16_le(crc);

    message
}

/// Decode a packet from unframed bytes
///
/// Fails with `Checksum` on CRC mismatch and `MalformedPacket` when the bytes
/// are too short or the payload exceeds `max_payload`.
pub fn decode_packet(bytes: &[u8], max_payload: usize) -> Result<Packet> {
    if bytes.len() < MIN_PACKET_SIZE {
        return Err(WheelError::MalformedPacket(format!(
            "packet too short: expected at least {} bytes, got {}",
            MIN_PACKET_SIZE,
            bytes.len()
        )));
    }

    crc::verify(bytes).map_err(|(received, computed)| WheelError::Checksum { received, computed })?;

    let payload_len = bytes.len() - MIN_PACKET_SIZE;
    if payload_len > max_payload {
        return Err(WheelError::MalformedPacket(format!(
            "payload too large: {} bytes (max {})",
            payload_len, max_payload
        )));
    }

    let mut buf = bytes;
    let dest = buf.get_u8();
    let src = buf.get_u8();
    let control = Control::from_byte(buf.get_u8());
    let payload = Bytes::copy_from_slice(&buf[..payload_len]);
    buf.advance(payload_len);
    let checksum = buf.get_u16_le();

    Ok(Packet::from_verified(dest, src, control, payload, checksum))
}

/// Checksum over a header and payload without building the byte vector
pub(super) fn checksum_of(dest: u8, src: u8, control: u8, payload: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(&[dest, src, control]);
    crc.update(payload);
    crc.finalize()
}

// =============================================================================
// Field Encoding/Decoding
// =============================================================================

/// Encode typed values according to a fixed field layout
pub fn encode_fields(layout: &[FieldKind], values: &[Value]) -> Result<Vec<u8>> {
    if layout.len() != values.len() {
        return Err(WheelError::MalformedPacket(format!(
            "expected {} fields, got {}",
            layout.len(),
            values.len()
        )));
    }

    let width = layout.iter().map(|k| k.width()).sum();
    let mut payload = Vec::with_capacity(width);

    for (index, (kind, value)) in layout.iter().zip(values).enumerate() {
        match (kind, value) {
            (FieldKind::U8, Value::U8(v)) => payload.put_u8(*v),
            (FieldKind::U32, Value::U32(v)) => payload.put_u32_le(*v),
            (FieldKind::F32, Value::F32(v)) => payload.put_f32_le(*v),
            (kind, value) => {
                return Err(WheelError::MalformedPacket(format!(
                    "field {}: expected {:?}, got {:?}",
                    index,
                    kind,
                    value.kind()
                )))
            }
        }
    }

    Ok(payload)
}

/// Decode a payload that must match a fixed field layout exactly
pub fn decode_fields(layout: &[FieldKind], bytes: &[u8]) -> Result<Vec<Value>> {
    let width: usize = layout.iter().map(|k| k.width()).sum();
    if bytes.len() != width {
        return Err(WheelError::MalformedPacket(format!(
            "payload width mismatch: expected {} bytes, got {}",
            width,
            bytes.len()
        )));
    }

    let mut buf = bytes;
    let values = layout
        .iter()
        .map(|kind| match kind {
            FieldKind::U8 => Value::U8(buf.get_u8()),
            FieldKind::U32 => Value::U32(buf.get_u32_le()),
            FieldKind::F32 => Value::F32(buf.get_f32_le()),
        })
        .collect();

    Ok(values)
}
