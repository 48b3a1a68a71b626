//! Command definitions
//!
//! The ICD command table (Table 5) and wheel control modes (§7.5) as static
//! read-only data indexed by enum.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WheelError};

/// NSP command identifiers (low five bits of the control byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NspCommand {
    Ping = 0x00,
    Init = 0x01,
    Peek = 0x02,
    Poke = 0x03,
    Diagnostic = 0x04,
    Crc = 0x06,
    ReadFile = 0x07,
    WriteFile = 0x08,
}

impl NspCommand {
    pub const ALL: [NspCommand; 8] = [
        NspCommand::Ping,
        NspCommand::Init,
        NspCommand::Peek,
        NspCommand::Poke,
        NspCommand::Diagnostic,
        NspCommand::Crc,
        NspCommand::ReadFile,
        NspCommand::WriteFile,
    ];

    /// Wire identifier
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Static descriptor for this command
    pub fn descriptor(self) -> &'static CommandDescriptor {
        &DESCRIPTORS[self.index()]
    }

    fn index(self) -> usize {
        match self {
            NspCommand::Ping => 0,
            NspCommand::Init => 1,
            NspCommand::Peek => 2,
            NspCommand::Poke => 3,
            NspCommand::Diagnostic => 4,
            NspCommand::Crc => 5,
            NspCommand::ReadFile => 6,
            NspCommand::WriteFile => 7,
        }
    }
}

impl TryFrom<u8> for NspCommand {
    type Error = WheelError;

    fn try_from(id: u8) -> Result<Self> {
        NspCommand::ALL
            .into_iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| WheelError::MalformedPacket(format!("unknown command id 0x{:02x}", id)))
    }
}

/// Binary encoding of one payload field (all little-endian)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U32,
    /// IEEE-754 single precision
    F32,
}

impl FieldKind {
    pub fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U32 | FieldKind::F32 => 4,
        }
    }
}

/// A typed payload field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    U32(u32),
    F32(f32),
}

impl Value {
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::U8(_) => FieldKind::U8,
            Value::U32(_) => FieldKind::U32,
            Value::F32(_) => FieldKind::F32,
        }
    }
}

/// Shape of a request or reply payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No payload bytes
    Empty,
    /// Fixed sequence of typed fields
    Fields(&'static [FieldKind]),
    /// Device-defined bytes, not interpreted by the codec
    Opaque,
}

impl Layout {
    /// Total payload width, if fixed
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Layout::Empty => Some(0),
            Layout::Fields(fields) => Some(fields.iter().map(|f| f.width()).sum()),
            Layout::Opaque => None,
        }
    }
}

/// Static description of one NSP command
#[derive(Debug)]
pub struct CommandDescriptor {
    pub command: NspCommand,
    pub name: &'static str,
    pub request: Layout,
    pub reply: Layout,
}

static DESCRIPTORS: [CommandDescriptor; 8] = [
    CommandDescriptor {
        command: NspCommand::Ping,
        name: "PING",
        request: Layout::Empty,
        reply: Layout::Opaque,
    },
    CommandDescriptor {
        command: NspCommand::Init,
        name: "INIT",
        request: Layout::Fields(&[FieldKind::U32]),
        reply: Layout::Opaque,
    },
    CommandDescriptor {
        command: NspCommand::Peek,
        name: "PEEK",
        request: Layout::Opaque,
        reply: Layout::Opaque,
    },
    CommandDescriptor {
        command: NspCommand::Poke,
        name: "POKE",
        request: Layout::Opaque,
        reply: Layout::Opaque,
    },
    CommandDescriptor {
        command: NspCommand::Diagnostic,
        name: "DIAGNOSTIC",
        request: Layout::Opaque,
        reply: Layout::Opaque,
    },
    CommandDescriptor {
        command: NspCommand::Crc,
        name: "CRC",
        request: Layout::Opaque,
        reply: Layout::Opaque,
    },
    CommandDescriptor {
        command: NspCommand::ReadFile,
        name: "READ_FILE",
        request: Layout::Fields(&[FieldKind::U8]),
        // Value is f32 for every point except the u32 hall bitfield
        reply: Layout::Fields(&[FieldKind::U8, FieldKind::F32]),
    },
    CommandDescriptor {
        command: NspCommand::WriteFile,
        name: "WRITE_FILE",
        request: Layout::Fields(&[FieldKind::U8, FieldKind::U8, FieldKind::F32]),
        reply: Layout::Opaque,
    },
];

/// Wheel control modes, written to the command-value file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WheelMode {
    Idle = 0x00,
    Speed = 0x03,
    Momentum = 0x11,
    Torque = 0x12,
}

impl WheelMode {
    /// Mode identifier sent in a WRITE_FILE to the command-value file
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            WheelMode::Idle => "IDLE",
            WheelMode::Speed => "SPEED",
            WheelMode::Momentum => "MOMENTUM",
            WheelMode::Torque => "TORQUE",
        }
    }
}

impl TryFrom<u8> for WheelMode {
    type Error = WheelError;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            0x00 => Ok(WheelMode::Idle),
            0x03 => Ok(WheelMode::Speed),
            0x11 => Ok(WheelMode::Momentum),
            0x12 => Ok(WheelMode::Torque),
            other => Err(WheelError::MalformedPacket(format!(
                "unknown wheel mode 0x{:02x}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for WheelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
