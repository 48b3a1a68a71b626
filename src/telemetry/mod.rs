//! Telemetry Module
//!
//! Conversion between raw EDAC file values and engineering units.
//!
//! ## Responsibilities
//! - Static table of telemetry points (ICD Table 9)
//! - Raw-to-engineering conversion: `value = raw * scale + offset`
//! - Unit attachment for presentation
//!
//! Lookups are local; nothing here touches the transport.

mod points;
mod codec;

pub use points::{TelemetryId, TelemetryPoint, RawEncoding, Unit, POINTS};
pub use codec::{decode, encode, lookup, Reading};

/// EDAC file holding the commanded mode and value (written, never read as telemetry)
pub const COMMAND_VALUE_FILE: u8 = 0x00;
