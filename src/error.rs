//! Error types for nspwheel
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using WheelError
pub type Result<T> = std::result::Result<T, WheelError>;

/// Unified error type for nspwheel operations
#[derive(Debug, Error)]
pub enum WheelError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Wire Errors (absorbed by the dispatcher while waiting for a reply)
    // -------------------------------------------------------------------------
    #[error("Framing error: invalid escape byte 0x{0:02x}")]
    Framing(u8),

    #[error("Checksum mismatch: received 0x{received:04x}, computed 0x{computed:04x}")]
    Checksum { received: u16, computed: u16 },

    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    // -------------------------------------------------------------------------
    // Exchange Errors
    // -------------------------------------------------------------------------
    #[error("Timed out waiting for reply to command 0x{command:02x} after {attempts} attempt(s)")]
    Timeout { command: u8, attempts: u32 },

    #[error("Device rejected command 0x{command:02x} (NACK)")]
    RejectedCommand { command: u8 },

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    // -------------------------------------------------------------------------
    // Local Guard Errors (nothing is sent)
    // -------------------------------------------------------------------------
    #[error("{quantity} {requested} exceeds safe limit {limit}")]
    Range {
        quantity: &'static str,
        requested: f32,
        limit: f32,
    },

    #[error("Command requires {required} mode but wheel is in {current} mode")]
    ModeGuard {
        required: &'static str,
        current: &'static str,
    },

    #[error("Unsupported telemetry point: 0x{0:02x}")]
    UnsupportedTelemetry(u8),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WheelError {
    /// True for corruption the dispatcher discards and keeps waiting past
    pub fn is_line_noise(&self) -> bool {
        matches!(
            self,
            WheelError::Framing(_) | WheelError::Checksum { .. } | WheelError::MalformedPacket(_)
        )
    }
}
