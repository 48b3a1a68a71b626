//! Framing Module
//!
//! SLIP-style byte stuffing for NSP packets (ICD §4.1, Table 2).
//!
//! ## Frame Format
//! ```text
//! ┌──────┬──────────────────────────────────┬──────┐
//! │ FEND │   packet bytes, FEND/FESC escaped │ FEND │
//! └──────┴──────────────────────────────────┴──────┘
//! ```
//!
//! ### Escapes
//! - literal `FEND` (0xC0) → `FESC TFEND` (0xDB 0xDC)
//! - literal `FESC` (0xDB) → `FESC TFESC` (0xDB 0xDD)
//!
//! The layer imposes no length limit; packet size is bounded by the codec.

mod encoder;
mod decoder;

pub use encoder::{encode, encode_into};
pub use decoder::{decode_frame, SlipDecoder};

/// Frame end / delimiter
pub const FEND: u8 = 0xC0;

/// Frame escape
pub const FESC: u8 = 0xDB;

/// Escaped FEND token (follows FESC)
pub const TFEND: u8 = 0xDC;

/// Escaped FESC token (follows FESC)
pub const TFESC: u8 = 0xDD;
