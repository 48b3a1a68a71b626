//! Transport Module
//!
//! The byte-stream boundary the protocol engine runs over.
//!
//! ## Responsibilities
//! - Blocking write of a complete frame
//! - Blocking read bounded by a caller-supplied timeout
//! - Explicit open/close so the session can scope the resource
//!
//! The engine knows nothing about port names, baud rates or device files.
//! Adapters:
//! - [`TcpTransport`]: serial-over-IP bridges (ser2net and similar) and the
//!   `nspwheel-sim` binary
//! - [`ChannelTransport`]: in-process duplex pipe for tests and embedding

mod tcp;
mod channel;

use std::time::Duration;

use crate::error::Result;

pub use tcp::TcpTransport;
pub use channel::ChannelTransport;

/// A half-duplex byte stream to one device
pub trait Transport: Send {
    /// Acquire the underlying resource
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the underlying resource; must be safe to call twice
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write all bytes
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read whatever is available into `buf`, waiting at most `timeout`
    ///
    /// `Ok(0)` means nothing arrived before the timeout.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Drop any bytes received but not yet read
    fn clear_input(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        (**self).read(buf, timeout)
    }

    fn clear_input(&mut self) -> Result<()> {
        (**self).clear_input()
    }
}
