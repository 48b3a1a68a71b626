//! Packet definitions
//!
//! An NSP packet with its checksum attached. Packets are built once and never
//! mutated; the checksum always matches the bytes it covers.

use bytes::Bytes;

use super::codec;
use super::NspCommand;

const POLL_BIT: u8 = 0b1000_0000;
const B_BIT: u8 = 0b0100_0000;
const ACK_BIT: u8 = 0b0010_0000;
const COMMAND_MASK: u8 = 0b0001_1111;

/// Decoded control byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    /// Host requests a reply
    pub poll: bool,

    /// Reserved ping-pong bit, sent as zero
    pub b: bool,

    /// Set by the device when the command succeeded; clear means NACK
    pub ack: bool,

    /// Command identifier (five bits)
    pub command: u8,
}

impl Control {
    /// Control byte for a host request
    pub fn request(command: NspCommand, poll: bool) -> Self {
        Self {
            poll,
            b: false,
            ack: false,
            command: command.id(),
        }
    }

    /// Control byte for a device reply
    pub fn reply(command: u8, ack: bool) -> Self {
        Self {
            poll: false,
            b: false,
            ack,
            command: command & COMMAND_MASK,
        }
    }

    pub fn from_byte(byte: u8) -> Self {
        Self {
            poll: byte & POLL_BIT != 0,
            b: byte & B_BIT != 0,
            ack: byte & ACK_BIT != 0,
            command: byte & COMMAND_MASK,
        }
    }

    pub fn to_byte(self) -> u8 {
        let mut byte = self.command & COMMAND_MASK;
        if self.poll {
            byte |= POLL_BIT;
        }
        if self.b {
            byte |= B_BIT;
        }
        if self.ack {
            byte |= ACK_BIT;
        }
        byte
    }
}

/// A complete NSP packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    dest: u8,
    src: u8,
    control: Control,
    payload: Bytes,
    checksum: u16,
}

impl Packet {
    /// Build a packet and attach its checksum
    pub fn new(dest: u8, src: u8, control: Control, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let checksum = codec::checksum_of(dest, src, control.to_byte(), &payload);
        Self {
            dest,
            src,
            control,
            payload,
            checksum,
        }
    }

    /// Used by the codec once the received checksum has been verified
    pub(super) fn from_verified(
        dest: u8,
        src: u8,
        control: Control,
        payload: Bytes,
        checksum: u16,
    ) -> Self {
        Self {
            dest,
            src,
            control,
            payload,
            checksum,
        }
    }

    pub fn dest(&self) -> u8 {
        self.dest
    }

    pub fn src(&self) -> u8 {
        self.src
    }

    pub fn control(&self) -> Control {
        self.control
    }

    /// Raw command identifier from the control byte
    pub fn command_id(&self) -> u8 {
        self.control.command
    }

    /// Known command, if the identifier is in the ICD table
    pub fn command(&self) -> Option<NspCommand> {
        NspCommand::try_from(self.control.command).ok()
    }

    pub fn is_ack(&self) -> bool {
        self.control.ack
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Wire bytes including the trailing checksum
    pub fn encode(&self) -> Vec<u8> {
        codec::encode_packet(self.dest, self.src, self.control, &self.payload)
    }
}
