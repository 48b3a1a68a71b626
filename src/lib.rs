//! # nspwheel
//!
//! Host-side driver for the RW4-12 reaction wheel over the Nanosatellite
//! Protocol (NSP):
//! - SLIP framing with incremental decoding
//! - CRC-16 (CCITT polynomial, ICD bit order) integrity checks
//! - Typed packet and payload codec driven by a static command table
//! - Synchronous request/response dispatch with timeout, retry and NACK handling
//! - A session façade with a control-mode state machine and safety clamps
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WheelSession                           │
//! │         (mode state machine, clamps, one Mutex)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Dispatcher                             │
//! │        (one pending request, timeout, retries)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  protocol   │          │  telemetry  │
//!   │ packet+CRC  │          │ scale/unit  │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   framing   │ ───────▶ │  Transport  │
//!   │    SLIP     │          │ (TCP, chan) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use nspwheel::{Config, TcpTransport, WheelMode, WheelSession};
//!
//! # fn main() -> nspwheel::Result<()> {
//! let session = WheelSession::connect(Config::default(), TcpTransport::new("127.0.0.1:7000"))?;
//! println!("identity: {}", session.ping()?);
//! session.set_mode(WheelMode::Speed, 30.0)?;
//! println!("speed: {:.2} rad/s", session.read_speed()?);
//! session.close()?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod crc;
pub mod framing;
pub mod protocol;
pub mod telemetry;
pub mod transport;
pub mod dispatcher;
pub mod session;
pub mod sim;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{WheelError, Result};
pub use config::Config;
pub use protocol::{NspCommand, Packet, WheelMode};
pub use telemetry::{Reading, TelemetryId};
pub use transport::{ChannelTransport, TcpTransport, Transport};
pub use dispatcher::Dispatcher;
pub use session::WheelSession;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of nspwheel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
