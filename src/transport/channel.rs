//! In-process transport
//!
//! A duplex byte pipe built from two crossbeam channels. Each `write_all`
//! sends one chunk; reads drain chunks and keep any remainder for the next
//! call.

use std::io::ErrorKind;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use super::Transport;
use crate::error::{Result, WheelError};

/// One end of an in-process byte pipe
pub struct ChannelTransport {
    tx: Option<Sender<Vec<u8>>>,
    rx: Receiver<Vec<u8>>,
    /// Bytes received but not yet handed to a reader
    leftover: BytesMut,
}

impl ChannelTransport {
    /// Create two connected ends
    pub fn pair() -> (ChannelTransport, ChannelTransport) {
        let (a_tx, b_rx) = channel::unbounded();
        let (b_tx, a_rx) = channel::unbounded();
        (
            ChannelTransport::new(a_tx, a_rx),
            ChannelTransport::new(b_tx, b_rx),
        )
    }

    fn new(tx: Sender<Vec<u8>>, rx: Receiver<Vec<u8>>) -> Self {
        Self {
            tx: Some(tx),
            rx,
            leftover: BytesMut::new(),
        }
    }

    fn disconnected() -> WheelError {
        WheelError::Io(std::io::Error::new(
            ErrorKind::BrokenPipe,
            "channel peer disconnected",
        ))
    }

    fn drain_leftover(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.leftover.len());
        buf[..n].copy_from_slice(&self.leftover[..n]);
        self.leftover.advance(n);
        n
    }
}

impl Transport for ChannelTransport {
    fn close(&mut self) -> Result<()> {
        // Dropping the sender disconnects the peer's receiver
        self.tx = None;
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let tx = self.tx.as_ref().ok_or_else(Self::disconnected)?;
        tx.send(bytes.to_vec()).map_err(|_| Self::disconnected())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.leftover.is_empty() {
            return Ok(self.drain_leftover(buf));
        }
        match self.rx.recv_timeout(timeout) {
            Ok(chunk) => {
                self.leftover.extend_from_slice(&chunk);
                Ok(self.drain_leftover(buf))
            }
            Err(RecvTimeoutError::Timeout) => Ok(0),
            Err(RecvTimeoutError::Disconnected) => Err(Self::disconnected()),
        }
    }

    fn clear_input(&mut self) -> Result<()> {
        self.leftover.clear();
        loop {
            match self.rx.try_recv() {
                Ok(_) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }
}
