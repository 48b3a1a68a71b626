//! Telemetry point table
//!
//! One entry per readable EDAC file. The wheel reports values already in
//! engineering units, so most entries carry unit scale.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WheelError};

/// Readable telemetry points, valued by EDAC file address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TelemetryId {
    /// Primary bus voltage
    BusVoltage = 0x03,
    /// +3.3 V logic rail
    LogicVoltage = 0x08,
    Temperature0 = 0x10,
    Temperature1 = 0x11,
    Temperature2 = 0x12,
    Temperature3 = 0x13,
    /// Wheel angular velocity
    Speed = 0x15,
    /// Wheel angular momentum
    Momentum = 0x16,
    /// Hall sensor state bitfield
    HallDigital = 0x1B,
    /// Motor coil current
    MeasuredCurrent = 0x1F,
    /// Configured rotor inertia
    Inertia = 0x28,
}

impl TelemetryId {
    /// EDAC file address
    pub fn file(self) -> u8 {
        self as u8
    }

    /// Temperature sensor by index (0..=3)
    pub fn temperature(sensor: u8) -> Option<TelemetryId> {
        match sensor {
            0 => Some(TelemetryId::Temperature0),
            1 => Some(TelemetryId::Temperature1),
            2 => Some(TelemetryId::Temperature2),
            3 => Some(TelemetryId::Temperature3),
            _ => None,
        }
    }

    pub fn point(self) -> &'static TelemetryPoint {
        let index = match self {
            TelemetryId::BusVoltage => 0,
            TelemetryId::LogicVoltage => 1,
            TelemetryId::Temperature0 => 2,
            TelemetryId::Temperature1 => 3,
            TelemetryId::Temperature2 => 4,
            TelemetryId::Temperature3 => 5,
            TelemetryId::Speed => 6,
            TelemetryId::Momentum => 7,
            TelemetryId::HallDigital => 8,
            TelemetryId::MeasuredCurrent => 9,
            TelemetryId::Inertia => 10,
        };
        &POINTS[index]
    }
}

impl TryFrom<u8> for TelemetryId {
    type Error = WheelError;

    fn try_from(file: u8) -> Result<Self> {
        POINTS
            .iter()
            .find(|p| p.id.file() == file)
            .map(|p| p.id)
            .ok_or(WheelError::UnsupportedTelemetry(file))
    }
}

/// On-the-wire encoding of a raw value (little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEncoding {
    F32,
    U32,
}

impl RawEncoding {
    pub fn width(self) -> usize {
        4
    }
}

/// Engineering units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Volt,
    Ampere,
    Celsius,
    RadianPerSecond,
    NewtonMeterSecond,
    KilogramSquareMeter,
    Count,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::Celsius => "°C",
            Unit::RadianPerSecond => "rad/s",
            Unit::NewtonMeterSecond => "N·m·s",
            Unit::KilogramSquareMeter => "kg·m²",
            Unit::Count => "",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Static description of one telemetry point
#[derive(Debug)]
pub struct TelemetryPoint {
    pub id: TelemetryId,
    pub name: &'static str,
    pub encoding: RawEncoding,
    pub scale: f64,
    pub offset: f64,
    pub unit: Unit,
}

const fn point(id: TelemetryId, name: &'static str, encoding: RawEncoding, unit: Unit) -> TelemetryPoint {
    TelemetryPoint {
        id,
        name,
        encoding,
        scale: 1.0,
        offset: 0.0,
        unit,
    }
}

/// ICD Table 9, readable subset
pub static POINTS: [TelemetryPoint; 11] = [
    point(TelemetryId::BusVoltage, "VBUS", RawEncoding::F32, Unit::Volt),
    point(TelemetryId::LogicVoltage, "VCC", RawEncoding::F32, Unit::Volt),
    point(TelemetryId::Temperature0, "TEMP0", RawEncoding::F32, Unit::Celsius),
    point(TelemetryId::Temperature1, "TEMP1", RawEncoding::F32, Unit::Celsius),
    point(TelemetryId::Temperature2, "TEMP2", RawEncoding::F32, Unit::Celsius),
    point(TelemetryId::Temperature3, "TEMP3", RawEncoding::F32, Unit::Celsius),
    point(TelemetryId::Speed, "SPEED", RawEncoding::F32, Unit::RadianPerSecond),
    point(TelemetryId::Momentum, "MOMENTUM", RawEncoding::F32, Unit::NewtonMeterSecond),
    point(TelemetryId::HallDigital, "HALL_DIGITAL", RawEncoding::U32, Unit::Count),
    point(TelemetryId::MeasuredCurrent, "MEASURED_CURRENT", RawEncoding::F32, Unit::Ampere),
    point(TelemetryId::Inertia, "INERTIA", RawEncoding::F32, Unit::KilogramSquareMeter),
];
