//! Telemetry codec
//!
//! Applies a point's conversion to raw file bytes.

use serde::Serialize;

use super::points::{RawEncoding, TelemetryId, TelemetryPoint, Unit};
use crate::error::{Result, WheelError};

/// A converted telemetry value with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub id: TelemetryId,
    pub value: f64,
    pub unit: Unit,
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.id.point().name;
        if self.unit.symbol().is_empty() {
            write!(f, "{}: {}", name, self.value)
        } else {
            write!(f, "{}: {:.4} {}", name, self.value, self.unit)
        }
    }
}

/// Look up the table row for a file address
pub fn lookup(file: u8) -> Result<&'static TelemetryPoint> {
    TelemetryId::try_from(file).map(TelemetryId::point)
}

/// Convert raw file bytes to an engineering value
pub fn decode(file: u8, raw: &[u8]) -> Result<Reading> {
    let point = lookup(file)?;
    let width = point.encoding.width();
    let bytes: [u8; 4] = raw.try_into().map_err(|_| {
        WheelError::UnexpectedReply(format!(
            "{}: expected {} raw bytes, got {}",
            point.name,
            width,
            raw.len()
        ))
    })?;

    let raw_value = match point.encoding {
        RawEncoding::F32 => f32::from_le_bytes(bytes) as f64,
        RawEncoding::U32 => u32::from_le_bytes(bytes) as f64,
    };

    Ok(Reading {
        id: point.id,
        value: raw_value * point.scale + point.offset,
        unit: point.unit,
    })
}

/// Convert an engineering value back to raw file bytes
pub fn encode(id: TelemetryId, value: f64) -> [u8; 4] {
    let point = id.point();
    let raw = (value - point.offset) / point.scale;
    match point.encoding {
        RawEncoding::F32 => (raw as f32).to_le_bytes(),
        RawEncoding::U32 => (raw.round().clamp(0.0, u32::MAX as f64) as u32).to_le_bytes(),
    }
}
