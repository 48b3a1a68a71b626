//! Command Dispatcher
//!
//! Drives one request → response exchange over a transport.
//!
//! ## Exchange
//! 1. Encode the packet (Poll set when a reply is expected), frame it, write it
//! 2. Feed received bytes through the SLIP decoder until a reply arrives or
//!    the deadline passes
//! 3. Classify the first packet addressed to us that echoes the command:
//!    ACK → return it, NACK → `RejectedCommand`
//! 4. On deadline, resend the identical frame while retries remain, then
//!    fail with `Timeout`
//!
//! Corrupted frames (framing or checksum) and foreign packets are discarded
//! without ending the wait. A partial frame longer than the largest valid
//! packet is dropped as line noise.
//!
//! Only one request is ever pending: `exchange` holds `&mut self` until the
//! request resolves, so a second request cannot be issued before then.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{Result, WheelError};
use crate::framing::{self, SlipDecoder};
use crate::protocol::{decode_packet, Control, NspCommand, Packet, MIN_PACKET_SIZE};
use crate::transport::Transport;

/// Read chunk size
const READ_CHUNK: usize = 64;

/// The single in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub command: NspCommand,
    pub dest: u8,
    pub deadline: Instant,
    pub retries_remaining: u32,
}

/// Counters kept across exchanges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Frames written, retries included
    pub transmissions: u64,
    /// Resends after a deadline passed
    pub retries: u64,
    /// Frames dropped for framing, checksum or length errors
    pub discarded_frames: u64,
    /// Valid packets not addressed to this exchange
    pub ignored_packets: u64,
    /// Negative acknowledgements received
    pub nacks: u64,
}

/// Request/response engine bound to one transport
pub struct Dispatcher<T: Transport> {
    transport: T,
    decoder: SlipDecoder,
    host_addr: u8,
    wheel_addr: u8,
    timeout: Duration,
    max_retries: u32,
    max_payload: usize,
    pending: Option<PendingRequest>,
    stats: DispatchStats,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher from session config; the transport must be open
    pub fn new(config: &Config, transport: T) -> Self {
        Self {
            transport,
            decoder: SlipDecoder::new(),
            host_addr: config.host_addr,
            wheel_addr: config.wheel_addr,
            timeout: config.response_timeout(),
            max_retries: config.max_retries,
            max_payload: config.max_payload_size,
            pending: None,
            stats: DispatchStats::default(),
        }
    }

    /// Issue a request
    ///
    /// Returns the acknowledged reply when `expect_response` is set, `None`
    /// otherwise (the frame is sent without the Poll bit).
    pub fn request(
        &mut self,
        command: NspCommand,
        payload: &[u8],
        expect_response: bool,
    ) -> Result<Option<Packet>> {
        if expect_response {
            self.exchange(command, payload, self.timeout).map(Some)
        } else {
            self.send(command, payload).map(|_| None)
        }
    }

    /// Send a request and wait for its acknowledged reply
    ///
    /// `timeout` bounds each attempt; there are `max_retries + 1` attempts.
    pub fn exchange(&mut self, command: NspCommand, payload: &[u8], timeout: Duration) -> Result<Packet> {
        let frame = self.build_frame(command, payload, true)?;

        // Stale bytes from an abandoned exchange must not be taken as this reply
        self.transport.clear_input()?;
        self.decoder.reset();

        self.pending = Some(PendingRequest {
            command,
            dest: self.wheel_addr,
            deadline: Instant::now() + timeout,
            retries_remaining: self.max_retries,
        });

        let result = self.run(command, &frame, timeout);
        self.pending = None;
        result
    }

    /// Send a request without asking for a reply
    pub fn send(&mut self, command: NspCommand, payload: &[u8]) -> Result<()> {
        let frame = self.build_frame(command, payload, false)?;
        self.transmit(command, &frame)
    }

    fn build_frame(&self, command: NspCommand, payload: &[u8], poll: bool) -> Result<Vec<u8>> {
        if payload.len() > self.max_payload {
            return Err(WheelError::MalformedPacket(format!(
                "payload too large: {} bytes (max {})",
                payload.len(),
                self.max_payload
            )));
        }

        let packet = Packet::new(
            self.wheel_addr,
            self.host_addr,
            Control::request(command, poll),
            payload.to_vec(),
        );
        let bytes = packet.encode();
        tracing::debug!("TX > packet: {}", hex(&bytes));
        Ok(framing::encode(&bytes))
    }

    fn transmit(&mut self, command: NspCommand, frame: &[u8]) -> Result<()> {
        tracing::trace!(
            "TX > {} frame: {}",
            command.descriptor().name,
            hex(frame)
        );
        self.transport.write_all(frame)?;
        self.stats.transmissions += 1;
        Ok(())
    }

    fn run(&mut self, command: NspCommand, frame: &[u8], timeout: Duration) -> Result<Packet> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            self.transmit(command, frame)?;

            let deadline = Instant::now() + timeout;
            if let Some(pending) = self.pending.as_mut() {
                pending.deadline = deadline;
            }

            if let Some(reply) = self.await_reply(command, deadline)? {
                return self.classify(command, reply);
            }

            let retries_remaining = self.pending.map(|p| p.retries_remaining).unwrap_or(0);
            if retries_remaining == 0 {
                tracing::warn!(
                    "{} timed out after {} attempt(s)",
                    command.descriptor().name,
                    attempts
                );
                return Err(WheelError::Timeout {
                    command: command.id(),
                    attempts,
                });
            }

            if let Some(pending) = self.pending.as_mut() {
                pending.retries_remaining -= 1;
            }
            self.stats.retries += 1;
            tracing::warn!(
                "No reply to {} within {:?}, resending ({} retries left)",
                command.descriptor().name,
                timeout,
                retries_remaining - 1
            );
        }
    }

    /// Wait for a reply packet until `deadline`
    ///
    /// `Ok(None)` means the deadline passed. Transport errors end the wait.
    fn await_reply(&mut self, command: NspCommand, deadline: Instant) -> Result<Option<Packet>> {
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            let n = self.transport.read(&mut buf, deadline - now)?;
            for &byte in &buf[..n] {
                let frame = match self.decoder.push(byte) {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        if self.decoder.pending_len() > self.max_payload + MIN_PACKET_SIZE {
                            self.decoder.reset();
                            self.stats.discarded_frames += 1;
                            tracing::warn!("Discarding oversize partial frame");
                        }
                        continue;
                    }
                    Err(e) => {
                        self.stats.discarded_frames += 1;
                        tracing::warn!("Discarding frame: {}", e);
                        continue;
                    }
                };

                tracing::debug!("RX < packet: {}", hex(&frame));

                match decode_packet(&frame, self.max_payload) {
                    Ok(packet) if self.is_reply_to(&packet, command) => return Ok(Some(packet)),
                    Ok(packet) => {
                        self.stats.ignored_packets += 1;
                        tracing::debug!(
                            "Ignoring packet dest=0x{:02x} src=0x{:02x} cmd=0x{:02x}",
                            packet.dest(),
                            packet.src(),
                            packet.command_id()
                        );
                    }
                    Err(e) if e.is_line_noise() => {
                        self.stats.discarded_frames += 1;
                        tracing::warn!("Discarding frame: {}", e);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    fn is_reply_to(&self, packet: &Packet, command: NspCommand) -> bool {
        packet.src() == self.wheel_addr
            && packet.dest() == self.host_addr
            && packet.command_id() == command.id()
    }

    fn classify(&mut self, command: NspCommand, reply: Packet) -> Result<Packet> {
        if reply.is_ack() {
            Ok(reply)
        } else {
            self.stats.nacks += 1;
            tracing::warn!("{} rejected by wheel (NACK)", command.descriptor().name);
            Err(WheelError::RejectedCommand {
                command: command.id(),
            })
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The in-flight request, if any
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Default per-attempt timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

/// Space-separated hex dump for logs
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
