//! SLIP decoder
//!
//! Incremental unstuffing over a byte stream. Bytes are pushed one at a time
//! as they arrive from the transport; a payload is yielded for every
//! non-empty FEND-delimited segment.
//!
//! ## States
//! - `Collecting`: appending literal bytes to the current payload
//! - `Escaped`: previous byte was FESC, next byte selects the literal
//! - `Discarding`: an invalid escape was seen, skip until the next FEND

use bytes::{Bytes, BytesMut};

use super::{FEND, FESC, TFEND, TFESC};
use crate::error::{Result, WheelError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Collecting,
    Escaped,
    Discarding,
}

/// Stateful decoder for a SLIP byte stream
#[derive(Debug)]
pub struct SlipDecoder {
    /// Unstuffed bytes of the frame in progress
    buffer: BytesMut,
    state: State,
}

impl SlipDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
            state: State::Collecting,
        }
    }

    /// Push one received byte
    ///
    /// Returns:
    /// - `Ok(Some(payload))` when a FEND closes a non-empty frame
    /// - `Ok(None)` when more data is needed (including spurious FENDs)
    /// - `Err(WheelError::Framing)` on FESC followed by anything but
    ///   TFEND/TFESC; the partial frame is dropped and the decoder
    ///   resynchronises at the next FEND
    pub fn push(&mut self, byte: u8) -> Result<Option<Bytes>> {
        match self.state {
            State::Discarding => {
                if byte == FEND {
                    self.state = State::Collecting;
                }
                Ok(None)
            }
            State::Escaped => {
                let literal = match byte {
                    TFEND => FEND,
                    TFESC => FESC,
                    other => {
                        self.buffer.clear();
                        // A FEND here still terminates the broken frame
                        self.state = if other == FEND {
                            State::Collecting
                        } else {
                            State::Discarding
                        };
                        return Err(WheelError::Framing(other));
                    }
                };
                self.buffer.extend_from_slice(&[literal]);
                self.state = State::Collecting;
                Ok(None)
            }
            State::Collecting => match byte {
                FEND => {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    Ok(Some(self.buffer.split().freeze()))
                }
                FESC => {
                    self.state = State::Escaped;
                    Ok(None)
                }
                _ => {
                    self.buffer.extend_from_slice(&[byte]);
                    Ok(None)
                }
            },
        }
    }

    /// Push a chunk, collecting every completed frame or framing error
    pub fn push_slice(&mut self, data: &[u8]) -> Vec<Result<Bytes>> {
        data.iter()
            .filter_map(|&b| self.push(b).transpose())
            .collect()
    }

    /// Number of unstuffed bytes waiting for a closing FEND
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.state = State::Collecting;
    }
}

impl Default for SlipDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a single complete frame
///
/// Leading and trailing FENDs are optional. Fails if the bytes hold anything
/// other than exactly one non-empty payload.
pub fn decode_frame(frame: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = SlipDecoder::new();
    let mut payload = None;
    // The extra FEND closes an unterminated frame; an empty segment is ignored
    for &byte in frame.iter().chain(std::iter::once(&FEND)) {
        if let Some(p) = decoder.push(byte)? {
            if payload.replace(p).is_some() {
                return Err(WheelError::MalformedPacket(
                    "more than one frame in buffer".to_string(),
                ));
            }
        }
    }
    payload
        .map(|p| p.to_vec())
        .ok_or_else(|| WheelError::MalformedPacket("empty frame".to_string()))
}
