//! Device Simulator
//!
//! A software RW4-12 that answers NSP requests over any [`Transport`].
//!
//! ## Responsibilities
//! - Decode incoming frames and reply the way the wheel does (ACK/NACK,
//!   swapped addresses, echoed command id)
//! - Model the command-value file, mode changes and a crude rotor
//! - Fault injection: dropped, corrupted or refused replies
//!
//! The model is shared behind a mutex so a test can inspect it or inject
//! faults while a server thread owns the transport.

mod model;

use std::io::ErrorKind;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::dispatcher::hex;
use crate::error::{Result, WheelError};
use crate::framing::{self, SlipDecoder};
use crate::protocol::{decode_packet, MAX_PAYLOAD_SIZE};
use crate::transport::Transport;

pub use model::{Faults, WheelModel};

/// Poll interval of the serve loop
const SERVE_POLL: Duration = Duration::from_millis(50);

/// Handle to a simulated wheel; clones share one model
#[derive(Clone)]
pub struct SimulatedWheel {
    model: Arc<Mutex<WheelModel>>,
}

impl SimulatedWheel {
    /// Simulated wheel in application mode at `addr`
    pub fn new(addr: u8) -> Self {
        Self {
            model: Arc::new(Mutex::new(WheelModel::new(addr))),
        }
    }

    /// Start in the bootloader; only PING and INIT are accepted until INIT
    pub fn in_bootloader(self) -> Self {
        self.model.lock().application = false;
        self
    }

    /// Handle one raw (unframed) packet, returning the framed reply, if any
    pub fn handle_bytes(&self, raw: &[u8]) -> Option<Vec<u8>> {
        let packet = match decode_packet(raw, MAX_PAYLOAD_SIZE) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!("sim: dropping bad packet: {}", e);
                return None;
            }
        };

        let mut model = self.model.lock();
        let reply = model.handle(&packet)?;
        let mut bytes = reply.encode();

        if model.faults.drop_replies > 0 {
            model.faults.drop_replies -= 1;
            tracing::debug!("sim: dropping reply (fault)");
            return None;
        }
        if model.faults.corrupt_replies > 0 {
            model.faults.corrupt_replies -= 1;
            if let Some(last) = bytes.last_mut() {
                *last ^= 0xFF;
            }
            tracing::debug!("sim: corrupting reply checksum (fault)");
        }

        tracing::trace!("sim: reply {}", hex(&bytes));
        Some(framing::encode(&bytes))
    }

    /// Answer requests until the peer disconnects
    pub fn serve<T: Transport>(&self, mut transport: T) -> Result<()> {
        let mut decoder = SlipDecoder::new();
        let mut buf = [0u8; 256];

        loop {
            let n = match transport.read(&mut buf, SERVE_POLL) {
                Ok(n) => n,
                Err(WheelError::Io(e))
                    if matches!(
                        e.kind(),
                        ErrorKind::BrokenPipe
                            | ErrorKind::UnexpectedEof
                            | ErrorKind::ConnectionReset
                            | ErrorKind::ConnectionAborted
                    ) =>
                {
                    tracing::debug!("sim: peer disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            for &byte in &buf[..n] {
                match decoder.push(byte) {
                    Ok(Some(frame)) => {
                        if let Some(reply) = self.handle_bytes(&frame) {
                            transport.write_all(&reply)?;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => tracing::debug!("sim: {}", e),
                }
            }
        }
    }

    /// Serve on a background thread
    pub fn spawn<T: Transport + 'static>(&self, transport: T) -> JoinHandle<Result<()>> {
        let sim = self.clone();
        thread::spawn(move || sim.serve(transport))
    }

    /// Copy of the current model state
    pub fn snapshot(&self) -> WheelModel {
        self.model.lock().clone()
    }

    /// Adjust fault injection
    pub fn inject(&self, f: impl FnOnce(&mut Faults)) {
        f(&mut self.model.lock().faults);
    }

    /// Adjust the model directly (sensor values, identity, ...)
    pub fn configure(&self, f: impl FnOnce(&mut WheelModel)) {
        f(&mut self.model.lock());
    }
}
