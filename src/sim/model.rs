//! Simulated wheel state
//!
//! Command handling and a first-order rotor model. Each handled packet
//! advances the model by one fixed tick.

use crate::protocol::{decode_fields, Control, FieldKind, NspCommand, Packet, WheelMode, Value};
use crate::telemetry::{self, TelemetryId, COMMAND_VALUE_FILE};

/// Model time advanced per handled packet (seconds)
const TICK_S: f32 = 0.1;

/// Idle spin-down factor per tick
const IDLE_DECAY: f32 = 0.9;

/// Reply behaviour overrides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Faults {
    /// Swallow this many replies
    pub drop_replies: u32,
    /// Flip the checksum of this many replies
    pub corrupt_replies: u32,
    /// NACK every command
    pub nack_all: bool,
}

/// Full simulated device state
#[derive(Debug, Clone, PartialEq)]
pub struct WheelModel {
    pub addr: u8,
    pub identity: String,
    /// False while in the bootloader
    pub application: bool,
    pub mode: WheelMode,
    /// Last commanded value in wire units (rad/s, N·m or N·m·s)
    pub setpoint: f32,
    pub speed_rad_s: f32,
    pub inertia: f32,
    pub bus_voltage: f32,
    pub logic_voltage: f32,
    pub temperatures: [f32; 4],
    pub hall_state: u32,
    pub faults: Faults,
    /// Packets addressed to this wheel
    pub packets_received: u64,
}

impl WheelModel {
    pub fn new(addr: u8) -> Self {
        Self {
            addr,
            identity: "RW4-12 SIM 1.0".to_string(),
            application: true,
            mode: WheelMode::Idle,
            setpoint: 0.0,
            speed_rad_s: 0.0,
            inertia: 7.5e-4,
            bus_voltage: 28.0,
            logic_voltage: 3.3,
            temperatures: [24.5, 25.0, 25.5, 26.0],
            hall_state: 0b101,
            faults: Faults::default(),
            packets_received: 0,
        }
    }

    pub fn momentum(&self) -> f32 {
        self.speed_rad_s * self.inertia
    }

    pub fn current(&self) -> f32 {
        let drive = match self.mode {
            WheelMode::Torque => self.setpoint.abs() * 20.0,
            _ => 0.0,
        };
        0.02 + 0.0005 * self.speed_rad_s.abs() + drive
    }

    /// Process one valid packet; `None` when no reply is due
    pub fn handle(&mut self, packet: &Packet) -> Option<Packet> {
        if packet.dest() != self.addr {
            return None;
        }
        self.packets_received += 1;

        let command = packet.command_id();
        let outcome = if self.faults.nack_all {
            None
        } else {
            self.execute(packet)
        };
        self.tick();

        if !packet.control().poll {
            return None;
        }

        let (ack, payload) = match outcome {
            Some(payload) => (true, payload),
            None => (false, Vec::new()),
        };
        Some(Packet::new(
            packet.src(),
            self.addr,
            Control::reply(command, ack),
            payload,
        ))
    }

    /// Run a command; `None` means NACK
    fn execute(&mut self, packet: &Packet) -> Option<Vec<u8>> {
        let command = packet.command()?;
        if !self.application && !matches!(command, NspCommand::Ping | NspCommand::Init) {
            return None;
        }

        match command {
            NspCommand::Ping => Some(self.identity.as_bytes().to_vec()),
            NspCommand::Init => {
                decode_fields(&[FieldKind::U32], packet.payload()).ok()?;
                self.application = true;
                self.mode = WheelMode::Idle;
                self.setpoint = 0.0;
                Some(Vec::new())
            }
            NspCommand::ReadFile => {
                let values = decode_fields(&[FieldKind::U8], packet.payload()).ok()?;
                let file = match values.first() {
                    Some(Value::U8(file)) => *file,
                    _ => return None,
                };
                let id = TelemetryId::try_from(file).ok()?;
                let mut reply = vec![file];
                reply.extend_from_slice(&telemetry::encode(id, self.read(id)));
                Some(reply)
            }
            NspCommand::WriteFile => {
                let layout = [FieldKind::U8, FieldKind::U8, FieldKind::F32];
                match decode_fields(&layout, packet.payload()).ok()?.as_slice() {
                    [Value::U8(COMMAND_VALUE_FILE), Value::U8(mode), Value::F32(value)] => {
                        let mode = WheelMode::try_from(*mode).ok()?;
                        if !value.is_finite() {
                            return None;
                        }
                        self.command(mode, *value);
                        Some(Vec::new())
                    }
                    _ => None,
                }
            }
            NspCommand::Peek | NspCommand::Poke | NspCommand::Diagnostic | NspCommand::Crc => None,
        }
    }

    fn command(&mut self, mode: WheelMode, value: f32) {
        self.mode = mode;
        self.setpoint = match mode {
            WheelMode::Idle => 0.0,
            _ => value,
        };
        match mode {
            WheelMode::Speed => self.speed_rad_s = value,
            WheelMode::Momentum => self.speed_rad_s = value / self.inertia,
            WheelMode::Idle | WheelMode::Torque => {}
        }
    }

    fn tick(&mut self) {
        match self.mode {
            WheelMode::Idle => {
                self.speed_rad_s *= IDLE_DECAY;
                if self.speed_rad_s.abs() < 1e-3 {
                    self.speed_rad_s = 0.0;
                }
            }
            WheelMode::Torque => self.speed_rad_s += self.setpoint / self.inertia * TICK_S,
            WheelMode::Speed | WheelMode::Momentum => {}
        }
        self.hall_state = (self.hall_state % 6) + 1;
    }

    fn read(&self, id: TelemetryId) -> f64 {
        let value = match id {
            TelemetryId::BusVoltage => self.bus_voltage,
            TelemetryId::LogicVoltage => self.logic_voltage,
            TelemetryId::Temperature0 => self.temperatures[0],
            TelemetryId::Temperature1 => self.temperatures[1],
            TelemetryId::Temperature2 => self.temperatures[2],
            TelemetryId::Temperature3 => self.temperatures[3],
            TelemetryId::Speed => self.speed_rad_s,
            TelemetryId::Momentum => self.momentum(),
            TelemetryId::HallDigital => return self.hall_state as f64,
            TelemetryId::MeasuredCurrent => self.current(),
            TelemetryId::Inertia => self.inertia,
        };
        value as f64
    }
}
