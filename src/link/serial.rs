//! Transport seam between the read loop and the physical serial port.

use std::io::{self, Read};
use std::time::Duration;

use tracing::debug;

use crate::config::PortConfig;
use crate::error::{LinkError, Result};

/// Abstraction over the byte transport the read loop owns.
///
/// Implementations are blocking by design: `read_chunk` returns whatever the
/// transport has buffered, or blocks up to a bounded timeout waiting for the
/// first byte. The read loop relies on that bound to observe stop requests
/// promptly. Tests substitute scripted implementations.
pub trait SerialLink: Send + 'static {
    /// Open the underlying connection. Called once, from the reader context.
    fn open(&mut self) -> Result<()>;

    /// Read available bytes into `buf`.
    ///
    /// Returns `Ok(n)` with `n > 0` for data, `Ok(0)` if the transport
    /// closed underneath us, and `ErrorKind::TimedOut` when the bounded wait
    /// elapsed without data (not a failure).
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Close the connection. Must be idempotent.
    fn close(&mut self);
}

/// [`SerialLink`] backed by a real serial port via the `serialport` crate.
pub struct SerialPortLink {
    config: PortConfig,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialPortLink {
    /// Prepare a link for the given configuration. The port is not touched
    /// until [`SerialLink::open`] runs on the reader context.
    pub fn new(config: PortConfig) -> Self {
        Self { config, port: None }
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }
}

impl SerialLink for SerialPortLink {
    fn open(&mut self) -> Result<()> {
        // A 1ms floor keeps a zero timeout from busy-spinning the loop.
        let timeout = self.config.read_timeout().max(Duration::from_millis(1));
        let port = serialport::new(&self.config.port, self.config.baud_rate)
            .flow_control(self.config.flow_control.into())
            .timeout(timeout)
            .open()
            .map_err(|e| LinkError::open_failed_with_source(&self.config.port, Box::new(e)))?;

        debug!(
            port = %self.config.port,
            baud = self.config.baud_rate,
            "serial port opened"
        );
        self.port = Some(port);
        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.as_mut() {
            Some(port) => port.read(buf),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "port not open")),
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.config.port, "serial port closed");
        }
    }
}
