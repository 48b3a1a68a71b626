//! Configuration for nspwheel
//!
//! Centralized configuration with sensible defaults. A `Config` value is
//! handed to the session at construction; nothing here is process-global.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WheelError};

/// Main configuration for a wheel session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Addressing
    // -------------------------------------------------------------------------
    /// NSP address of the host (source of every request)
    pub host_addr: u8,

    /// NSP address of the wheel (destination of every request)
    pub wheel_addr: u8,

    // -------------------------------------------------------------------------
    // Exchange Timing
    // -------------------------------------------------------------------------
    /// How long to wait for a reply before resending (milliseconds)
    pub response_timeout_ms: u64,

    /// Reply timeout for INIT, which restarts the wheel firmware (milliseconds)
    pub init_timeout_ms: u64,

    /// Resends after the first transmission before giving up
    pub max_retries: u32,

    /// Largest packet payload accepted or produced (bytes)
    pub max_payload_size: usize,

    // -------------------------------------------------------------------------
    // Safety Clamps
    // -------------------------------------------------------------------------
    /// Maximum commanded wheel speed magnitude (RPM)
    pub max_speed_rpm: f32,

    /// Maximum commanded torque magnitude (N·m)
    pub max_torque_nm: f32,

    /// Maximum commanded angular momentum magnitude (N·m·s)
    pub max_momentum_nms: f32,

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    /// Send INIT (bootloader → application) while connecting
    pub initialize_on_connect: bool,

    /// Command IDLE when the session closes outside IDLE
    pub idle_on_close: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_addr: 0x11,
            wheel_addr: 0x20,
            response_timeout_ms: 1000,
            init_timeout_ms: 3000,
            max_retries: 2,
            max_payload_size: 1024,
            max_speed_rpm: 5252.0,
            max_torque_nm: 0.05,
            max_momentum_nms: 0.1,
            initialize_on_connect: false,
            idle_on_close: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reply timeout as a `Duration`
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// INIT reply timeout as a `Duration`
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    /// Check the values for combinations the session cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.host_addr == self.wheel_addr {
            return Err(WheelError::Config(format!(
                "host and wheel share address 0x{:02x}",
                self.host_addr
            )));
        }
        if self.response_timeout_ms == 0 || self.init_timeout_ms == 0 {
            return Err(WheelError::Config("timeouts must be non-zero".to_string()));
        }
        for (name, limit) in [
            ("max_speed_rpm", self.max_speed_rpm),
            ("max_torque_nm", self.max_torque_nm),
            ("max_momentum_nms", self.max_momentum_nms),
        ] {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(WheelError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, limit
                )));
            }
        }
        Ok(())
    }
}

/// Parse an NSP address given in decimal or `0x`-prefixed hex
pub fn parse_addr(s: &str) -> Result<u8> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| WheelError::Config(format!("invalid address {:?}: {}", s, e)))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the host NSP address
    pub fn host_addr(mut self, addr: u8) -> Self {
        self.config.host_addr = addr;
        self
    }

    /// Set the wheel NSP address
    pub fn wheel_addr(mut self, addr: u8) -> Self {
        self.config.wheel_addr = addr;
        self
    }

    /// Set the reply timeout (in milliseconds)
    pub fn response_timeout_ms(mut self, ms: u64) -> Self {
        self.config.response_timeout_ms = ms;
        self
    }

    /// Set the INIT reply timeout (in milliseconds)
    pub fn init_timeout_ms(mut self, ms: u64) -> Self {
        self.config.init_timeout_ms = ms;
        self
    }

    /// Set the number of resends after the first transmission
    pub fn max_retries(mut self, count: u32) -> Self {
        self.config.max_retries = count;
        self
    }

    /// Set the largest accepted packet payload (in bytes)
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.config.max_payload_size = size;
        self
    }

    /// Set the speed clamp (in RPM)
    pub fn max_speed_rpm(mut self, rpm: f32) -> Self {
        self.config.max_speed_rpm = rpm;
        self
    }

    /// Set the torque clamp (in N·m)
    pub fn max_torque_nm(mut self, nm: f32) -> Self {
        self.config.max_torque_nm = nm;
        self
    }

    /// Set the momentum clamp (in N·m·s)
    pub fn max_momentum_nms(mut self, nms: f32) -> Self {
        self.config.max_momentum_nms = nms;
        self
    }

    /// Send INIT while connecting
    pub fn initialize_on_connect(mut self, enabled: bool) -> Self {
        self.config.initialize_on_connect = enabled;
        self
    }

    /// Command IDLE when the session closes outside IDLE
    pub fn idle_on_close(mut self, enabled: bool) -> Self {
        self.config.idle_on_close = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
