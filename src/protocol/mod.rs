//! Protocol Module
//!
//! The NSP packet layer (ICD §5): packet structure, control byte, checksum
//! attachment and the static command table.
//!
//! ## Packet Format
//! ```text
//! ┌──────────┬──────────┬──────────┬───────────────────┬─────────────┐
//! │ Dest (1) │ Src (1)  │ Ctrl (1) │  Payload (0..N)   │ CRC (2, LE) │
//! └──────────┴──────────┴──────────┴───────────────────┴─────────────┘
//! ```
//!
//! ### Control Byte
//! ```text
//!   7      6      5      4 .. 0
//! ┌──────┬──────┬──────┬──────────────┐
//! │ Poll │  B   │ ACK  │  Command id  │
//! └──────┴──────┴──────┴──────────────┘
//! ```
//!
//! ### Commands
//! - 0x00: PING        - Payload: empty, reply: ASCII identity
//! - 0x01: INIT        - Payload: start address (u32)
//! - 0x02: PEEK        - Payload: opaque
//! - 0x03: POKE        - Payload: opaque
//! - 0x04: DIAGNOSTIC  - Payload: opaque
//! - 0x06: CRC         - Payload: opaque
//! - 0x07: READ_FILE   - Payload: file id (u8), reply: file id (u8) + value
//! - 0x08: WRITE_FILE  - Payload: file id (u8) + mode (u8) + value (f32)

mod command;
mod packet;
mod codec;

pub use command::{CommandDescriptor, FieldKind, Layout, NspCommand, Value, WheelMode};
pub use packet::{Control, Packet};
pub use codec::{
    decode_fields, decode_packet, encode_fields, encode_packet, HEADER_SIZE, MAX_PAYLOAD_SIZE,
    MIN_PACKET_SIZE,
};
