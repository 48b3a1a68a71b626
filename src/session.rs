//! Wheel Session
//!
//! The caller-facing API: ping, initialize, telemetry reads and control-mode
//! changes, over an exclusively owned transport.
//!
//! ## Mode State Machine
//! ```text
//!            set_mode(SPEED|TORQUE|MOMENTUM) ACKed
//!   ┌──────┐ ─────────────────────────────────────▶ ┌──────────────────┐
//!   │ IDLE │                                         │ SPEED / TORQUE / │
//!   └──────┘ ◀───────────────────────────────────── │ MOMENTUM         │
//!                  set_mode(IDLE) / set_idle ACKed   └──────────────────┘
//! ```
//! The mode changes only when the wheel acknowledges the write. Mode-specific
//! setters are refused locally unless the session is already in that mode,
//! and every commanded magnitude is checked against the configured clamp
//! before anything is sent.
//!
//! ## Concurrency
//! All wire traffic goes through one `Mutex`, so overlapping callers on
//! different threads are serialized and never interleave frames.

use std::f32::consts::PI;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::error::{Result, WheelError};
use crate::protocol::{encode_fields, FieldKind, Layout, NspCommand, Packet, Value, WheelMode};
use crate::telemetry::{self, Reading, TelemetryId, COMMAND_VALUE_FILE};
use crate::transport::Transport;

/// Application firmware entry point passed with INIT
pub const APPLICATION_START_ADDRESS: u32 = 0x2005_0000;

/// Convert RPM to rad/s
pub fn rpm_to_rad_s(rpm: f32) -> f32 {
    rpm * (2.0 * PI / 60.0)
}

/// Convert rad/s to RPM
pub fn rad_s_to_rpm(rad_s: f32) -> f32 {
    rad_s * (60.0 / (2.0 * PI))
}

struct Inner<T: Transport> {
    dispatcher: Dispatcher<T>,
    mode: WheelMode,
    /// A mode write went unanswered; the wheel may have applied it
    uncertain: bool,
    closed: bool,
}

/// A connected reaction wheel
pub struct WheelSession<T: Transport> {
    config: Config,
    inner: Mutex<Inner<T>>,
}

impl<T: Transport> WheelSession<T> {
    /// Open the transport and start a session
    ///
    /// With `initialize_on_connect`, INIT is sent before returning; if it
    /// fails the transport is closed again and the error returned.
    pub fn connect(config: Config, mut transport: T) -> Result<Self> {
        config.validate()?;
        transport.open()?;

        let mut dispatcher = Dispatcher::new(&config, transport);

        if config.initialize_on_connect {
            if let Err(e) = send_init(&mut dispatcher, config.init_timeout()) {
                tracing::error!("INIT during connect failed: {}", e);
                if let Err(close_err) = dispatcher.transport_mut().close() {
                    tracing::warn!("Closing transport after failed INIT: {}", close_err);
                }
                return Err(e);
            }
        }

        tracing::info!(
            "Session open: host=0x{:02x} wheel=0x{:02x}",
            config.host_addr,
            config.wheel_addr
        );

        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                dispatcher,
                mode: WheelMode::Idle,
                uncertain: false,
                closed: false,
            }),
        })
    }

    // =========================================================================
    // Mode-independent Operations
    // =========================================================================

    /// Ping the wheel and return its identity string
    pub fn ping(&self) -> Result<String> {
        let reply = self.transact(NspCommand::Ping, &[])?;
        let identity = String::from_utf8_lossy(reply.payload())
            .trim_end_matches('\0')
            .to_string();
        tracing::debug!("Ping reply: {:?}", identity);
        Ok(identity)
    }

    /// Start the application firmware (bootloader → application mode)
    ///
    /// Uses the longer INIT timeout; the wheel restarts in IDLE.
    pub fn initialize(&self) -> Result<()> {
        tracing::info!("Sending INIT to start application firmware");
        let mut inner = self.inner.lock();
        send_init(&mut inner.dispatcher, self.config.init_timeout())?;
        inner.mode = WheelMode::Idle;
        inner.uncertain = false;
        tracing::info!("INIT acknowledged, wheel in application mode");
        Ok(())
    }

    /// Read one telemetry point
    pub fn read_telemetry(&self, id: TelemetryId) -> Result<Reading> {
        let payload = encode_fields(&[FieldKind::U8], &[Value::U8(id.file())])?;
        let reply = self.transact(NspCommand::ReadFile, &payload)?;

        let (&file, raw) = reply.payload().split_first().ok_or_else(|| {
            WheelError::UnexpectedReply("empty READ_FILE reply".to_string())
        })?;
        if file != id.file() {
            return Err(WheelError::UnexpectedReply(format!(
                "requested file 0x{:02x}, wheel replied with 0x{:02x}",
                id.file(),
                file
            )));
        }

        let reading = telemetry::decode(file, raw)?;
        tracing::debug!("{}", reading);
        Ok(reading)
    }

    /// Read a telemetry point by EDAC file address
    ///
    /// Unknown addresses fail with `UnsupportedTelemetry` before any I/O.
    pub fn read_telemetry_file(&self, file: u8) -> Result<Reading> {
        let id = TelemetryId::try_from(file)?;
        self.read_telemetry(id)
    }

    /// Read every point in the telemetry table
    pub fn read_all_telemetry(&self) -> Result<Vec<Reading>> {
        telemetry::POINTS
            .iter()
            .map(|p| self.read_telemetry(p.id))
            .collect()
    }

    pub fn read_bus_voltage(&self) -> Result<f64> {
        self.read_value(TelemetryId::BusVoltage)
    }

    pub fn read_logic_voltage(&self) -> Result<f64> {
        self.read_value(TelemetryId::LogicVoltage)
    }

    /// Wheel speed in rad/s
    pub fn read_speed(&self) -> Result<f64> {
        self.read_value(TelemetryId::Speed)
    }

    pub fn read_speed_rpm(&self) -> Result<f64> {
        // Speed arrives as f32, so nothing is lost in the narrowing
        self.read_speed().map(|s| rad_s_to_rpm(s as f32) as f64)
    }

    pub fn read_momentum(&self) -> Result<f64> {
        self.read_value(TelemetryId::Momentum)
    }

    pub fn read_current(&self) -> Result<f64> {
        self.read_value(TelemetryId::MeasuredCurrent)
    }

    pub fn read_inertia(&self) -> Result<f64> {
        self.read_value(TelemetryId::Inertia)
    }

    /// Temperature of thermistor `sensor` (0..=3) in °C
    pub fn read_temperature(&self, sensor: u8) -> Result<f64> {
        let id = TelemetryId::temperature(sensor)
            .ok_or(WheelError::UnsupportedTelemetry(0x10u8.saturating_add(sensor)))?;
        self.read_value(id)
    }

    fn read_value(&self, id: TelemetryId) -> Result<f64> {
        self.read_telemetry(id).map(|r| r.value)
    }

    // =========================================================================
    // Control Modes
    // =========================================================================

    /// Enter a control mode with an initial magnitude
    ///
    /// Units: SPEED in RPM, TORQUE in N·m, MOMENTUM in N·m·s; IDLE ignores
    /// the magnitude and commands zero.
    pub fn set_mode(&self, mode: WheelMode, magnitude: f32) -> Result<()> {
        let wire_value = self.checked_wire_value(mode, magnitude)?;
        let mut inner = self.inner.lock();
        self.write_command_value(&mut inner, mode, wire_value)
    }

    /// Command the wheel to IDLE
    pub fn set_idle(&self) -> Result<()> {
        self.set_mode(WheelMode::Idle, 0.0)
    }

    /// Change the speed setpoint (RPM); requires SPEED mode
    pub fn set_speed_rpm(&self, rpm: f32) -> Result<()> {
        self.set_in_mode(WheelMode::Speed, rpm)
    }

    /// Change the torque setpoint (N·m); requires TORQUE mode
    pub fn set_torque(&self, torque_nm: f32) -> Result<()> {
        self.set_in_mode(WheelMode::Torque, torque_nm)
    }

    /// Change the momentum setpoint (N·m·s); requires MOMENTUM mode
    pub fn set_momentum(&self, momentum_nms: f32) -> Result<()> {
        self.set_in_mode(WheelMode::Momentum, momentum_nms)
    }

    fn set_in_mode(&self, mode: WheelMode, magnitude: f32) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.mode != mode {
            return Err(WheelError::ModeGuard {
                required: mode.name(),
                current: inner.mode.name(),
            });
        }
        let wire_value = self.checked_wire_value(mode, magnitude)?;
        self.write_command_value(&mut inner, mode, wire_value)
    }

    /// Clamp check and unit conversion for a commanded magnitude
    fn checked_wire_value(&self, mode: WheelMode, magnitude: f32) -> Result<f32> {
        let (quantity, limit) = match mode {
            WheelMode::Idle => return Ok(0.0),
            WheelMode::Speed => ("speed (RPM)", self.config.max_speed_rpm),
            WheelMode::Torque => ("torque (N·m)", self.config.max_torque_nm),
            WheelMode::Momentum => ("momentum (N·m·s)", self.config.max_momentum_nms),
        };

        if !magnitude.is_finite() || magnitude.abs() > limit {
            return Err(WheelError::Range {
                quantity,
                requested: magnitude,
                limit,
            });
        }

        Ok(match mode {
            WheelMode::Speed => rpm_to_rad_s(magnitude),
            _ => magnitude,
        })
    }

    fn write_command_value(&self, inner: &mut Inner<T>, mode: WheelMode, wire_value: f32) -> Result<()> {
        let payload = command_value_payload(mode, wire_value)?;

        let result = inner
            .dispatcher
            .exchange(NspCommand::WriteFile, &payload, self.config.response_timeout());
        match result {
            Ok(_) => {}
            // A NACK means the wheel refused; anything else leaves it unknown
            Err(e @ WheelError::RejectedCommand { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!("{} write unconfirmed, wheel mode now uncertain", mode);
                inner.uncertain = true;
                return Err(e);
            }
        }

        inner.uncertain = false;
        if inner.mode != mode {
            tracing::info!("Wheel mode {} -> {}", inner.mode, mode);
        }
        inner.mode = mode;
        tracing::debug!("Commanded {} value {}", mode, wire_value);
        Ok(())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Command IDLE if needed and release the transport
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.lock();
        shutdown(&mut inner, &self.config)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current control mode as last acknowledged by the wheel
    pub fn mode(&self) -> WheelMode {
        self.inner.lock().mode
    }

    /// True after a mode write failed without a NACK, until the next
    /// acknowledged write or INIT
    pub fn mode_uncertain(&self) -> bool {
        self.inner.lock().uncertain
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> DispatchStats {
        self.inner.lock().dispatcher.stats()
    }

    /// Run a closure against the transport (for diagnostics and tests)
    pub fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(self.inner.lock().dispatcher.transport_mut())
    }

    fn transact(&self, command: NspCommand, payload: &[u8]) -> Result<Packet> {
        self.inner
            .lock()
            .dispatcher
            .exchange(command, payload, self.config.response_timeout())
    }
}

impl<T: Transport> Drop for WheelSession<T> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if let Err(e) = shutdown(inner, &self.config) {
            tracing::warn!("Error closing wheel session: {}", e);
        }
    }
}

/// WRITE_FILE payload for the command-value file: file, mode, value
fn command_value_payload(mode: WheelMode, wire_value: f32) -> Result<Vec<u8>> {
    let layout = match NspCommand::WriteFile.descriptor().request {
        Layout::Fields(fields) => fields,
        other => {
            return Err(WheelError::MalformedPacket(format!(
                "WRITE_FILE has no fixed layout: {:?}",
                other
            )))
        }
    };
    encode_fields(
        layout,
        &[
            Value::U8(COMMAND_VALUE_FILE),
            Value::U8(mode.id()),
            Value::F32(wire_value),
        ],
    )
}

fn send_init<T: Transport>(dispatcher: &mut Dispatcher<T>, timeout: Duration) -> Result<()> {
    let payload = encode_fields(&[FieldKind::U32], &[Value::U32(APPLICATION_START_ADDRESS)])?;
    dispatcher.exchange(NspCommand::Init, &payload, timeout)?;
    Ok(())
}

/// Safe IDLE then transport close; runs once per session
fn shutdown<T: Transport>(inner: &mut Inner<T>, config: &Config) -> Result<()> {
    if inner.closed {
        return Ok(());
    }
    inner.closed = true;

    if config.idle_on_close && (inner.mode != WheelMode::Idle || inner.uncertain) {
        tracing::info!("Commanding wheel to IDLE before closing");
        let idle = command_value_payload(WheelMode::Idle, 0.0)?;
        match inner
            .dispatcher
            .exchange(NspCommand::WriteFile, &idle, config.response_timeout())
        {
            Ok(_) => {
                inner.mode = WheelMode::Idle;
                inner.uncertain = false;
            }
            Err(e) => tracing::warn!("Could not command wheel to IDLE on close: {}", e),
        }
    }

    inner.dispatcher.transport_mut().close()?;
    tracing::info!("Session closed");
    Ok(())
}
