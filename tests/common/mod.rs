//! Shared test helpers
//!
//! A scripted transport that plays back canned device replies, one per
//! write, and records everything the host sends.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use nspwheel::framing;
use nspwheel::protocol::{Control, NspCommand, Packet};
use nspwheel::{Config, Result, Transport};

pub const HOST: u8 = 0x11;
pub const WHEEL: u8 = 0x20;

/// What the fake device does after a write
#[derive(Debug, Clone)]
pub enum Reply {
    /// Deliver these bytes
    Bytes(Vec<u8>),
    /// Say nothing
    Silence,
}

#[derive(Debug, Default)]
pub struct ScriptState {
    pub writes: Vec<Vec<u8>>,
    pub replies: VecDeque<Reply>,
    pub inbound: VecDeque<u8>,
    pub opened: bool,
    pub closed: bool,
    pub fail_open: bool,
}

/// Inspection handle for a `ScriptedTransport`
#[derive(Clone, Default)]
pub struct Probe {
    state: Arc<Mutex<ScriptState>>,
}

impl Probe {
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes.len()
    }

    pub fn is_open(&self) -> bool {
        let state = self.state.lock();
        state.opened && !state.closed
    }

    pub fn was_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Queue another reply
    pub fn push_reply(&self, reply: Reply) {
        self.state.lock().replies.push_back(reply);
    }

    /// Packets decoded from everything written so far
    pub fn sent_packets(&self) -> Vec<Packet> {
        self.writes()
            .iter()
            .map(|w| {
                let raw = framing::decode_frame(w).unwrap();
                nspwheel::protocol::decode_packet(&raw, 1024).unwrap()
            })
            .collect()
    }
}

/// Transport that answers each write with the next scripted reply
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> (Self, Probe) {
        let probe = Probe::default();
        probe.state.lock().replies = replies.into();
        (
            Self {
                state: Arc::clone(&probe.state),
            },
            probe,
        )
    }

    /// Never answers
    pub fn silent() -> (Self, Probe) {
        Self::new(Vec::new())
    }

    pub fn failing_open() -> (Self, Probe) {
        let (transport, probe) = Self::new(Vec::new());
        probe.state.lock().fail_open = true;
        (transport, probe)
    }
}

impl Transport for ScriptedTransport {
    fn open(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_open {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such port").into());
        }
        state.opened = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        state.writes.push(bytes.to_vec());
        if let Some(Reply::Bytes(reply)) = state.replies.pop_front() {
            state.inbound.extend(reply);
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        {
            let mut state = self.state.lock();
            if !state.inbound.is_empty() {
                let n = buf.len().min(state.inbound.len());
                for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
        }
        thread::sleep(timeout);
        Ok(0)
    }
}

// =============================================================================
// Reply Builders
// =============================================================================

/// Framed reply from the wheel to the host
pub fn reply_frame(command: NspCommand, ack: bool, payload: &[u8]) -> Vec<u8> {
    let packet = Packet::new(HOST, WHEEL, Control::reply(command.id(), ack), payload.to_vec());
    framing::encode(&packet.encode())
}

pub fn ack(command: NspCommand, payload: &[u8]) -> Reply {
    Reply::Bytes(reply_frame(command, true, payload))
}

pub fn nack(command: NspCommand) -> Reply {
    Reply::Bytes(reply_frame(command, false, &[]))
}

/// READ_FILE reply carrying an f32 value
pub fn file_reply(file: u8, value: f32) -> Reply {
    let mut payload = vec![file];
    payload.extend_from_slice(&value.to_le_bytes());
    ack(NspCommand::ReadFile, &payload)
}

/// Config with short timeouts so silent-device tests finish quickly
pub fn fast_config() -> Config {
    Config::builder()
        .host_addr(HOST)
        .wheel_addr(WHEEL)
        .response_timeout_ms(20)
        .init_timeout_ms(40)
        .max_retries(2)
        .build()
}
