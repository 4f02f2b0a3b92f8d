//! Serial port transport
//!
//! Talks to a module wired to a local UART (USB-serial adapter or a
//! board's serial pins). The module speaks 8N1 at 57600 baud by default.

use std::io::{Read, Write};
use std::time::Duration;

use async_trait::async_trait;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, trace, warn};

use fpm383_core::constants::DEFAULT_BAUD_RATE;

use crate::{clock::Clock, error::*, ByteTransport};

/// Serial port transport
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    read_timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
    clock: Clock,
}

impl SerialTransport {
    /// Create a transport for the port at `path` (e.g. `/dev/ttyUSB0`, `COM3`)
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
            port: None,
            clock: Clock::new(),
        }
    }

    /// Set the baud rate used when the port is opened
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the port's low-level read timeout
    ///
    /// Reads only happen once bytes are buffered, so this is a safety net.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Current baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl ByteTransport for SerialTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        debug!("Opening {} at {} baud...", self.path, self.baud_rate);

        let port = serialport::new(&self.path, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open()?;

        debug!("Opened {}", self.path);

        self.port = Some(port);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!("Closed {}", self.path);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port_mut()?;

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        port.write_all(data)?;
        port.flush()?;

        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let port = self.port_mut()?;
        Ok(port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let port = self.port_mut()?;

        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(Error::Empty),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Err(Error::Empty),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        if let Some(port) = self.port.as_mut() {
            port.set_baud_rate(baud_rate)?;
        }

        debug!("{} switched to {} baud", self.path, baud_rate);
        self.baud_rate = baud_rate;
        Ok(())
    }

    fn name(&self) -> String {
        self.path.clone()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("Serial transport dropped while still connected");
        }
    }
}
