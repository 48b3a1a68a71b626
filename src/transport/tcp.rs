//! TCP transport
//!
//! Carries the raw serial byte stream over a TCP connection.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use super::Transport;
use crate::error::{Result, WheelError};

/// Smallest timeout handed to the socket (zero would mean "block forever")
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Transport over a TCP stream
pub struct TcpTransport {
    /// Remote address, used by `open`
    addr: String,

    /// Connected stream, present between open and close
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Create an unopened transport for `addr` (host:port)
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            stream: None,
        }
    }

    /// Wrap an already-connected stream (server side)
    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        let addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        // Frames are small; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        Ok(Self {
            addr,
            stream: Some(stream),
        })
    }

    /// Remote address string
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or_else(|| {
            WheelError::Io(std::io::Error::new(
                ErrorKind::NotConnected,
                "transport is not open",
            ))
        })
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect(&self.addr)?;
        stream.set_nodelay(true)?;
        tracing::debug!("Connected to {}", self.addr);
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            tracing::debug!("Closing connection to {}", self.addr);
            match stream.shutdown(std::net::Shutdown::Both) {
                Ok(()) => {}
                // Peer already gone
                Err(e) if e.kind() == ErrorKind::NotConnected => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream()?;
        stream.set_read_timeout(Some(timeout.max(MIN_READ_TIMEOUT)))?;

        match stream.read(buf) {
            Ok(0) => Err(WheelError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed by peer",
            ))),
            Ok(n) => Ok(n),
            // Read timeout (Windows uses TimedOut instead of WouldBlock)
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn clear_input(&mut self) -> Result<()> {
        let stream = self.stream()?;
        stream.set_nonblocking(true)?;
        let mut scratch = [0u8; 256];
        let result = loop {
            match stream.read(&mut scratch) {
                Ok(0) => break Ok(()),
                Ok(n) => tracing::trace!("Dropped {} stale bytes", n),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => break Err(e.into()),
            }
        };
        stream.set_nonblocking(false)?;
        result
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
