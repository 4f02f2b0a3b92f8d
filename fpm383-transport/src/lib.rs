//! Transport layer for the FPM383 protocol
//!
//! The protocol runs over a plain byte stream (the module's UART). This
//! crate provides the byte-level interface the driver needs and a few ways
//! to reach a module: a local serial port, a serial-over-TCP bridge, and an
//! in-memory link for tests and simulation.

pub mod clock;
pub mod error;
pub mod memory;
pub mod serial;
pub mod tcp;

pub use clock::Clock;
pub use error::{Error, Result};
pub use memory::{MemoryPeer, MemoryTransport};
pub use serial::SerialTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;

/// Byte-stream transport to a module
///
/// Reads never block: the driver checks [`bytes_available`] and only
/// calls [`read_byte`] when a byte is buffered. Waiting is the driver's
/// job, bounded by [`now_millis`].
///
/// [`bytes_available`]: ByteTransport::bytes_available
/// [`read_byte`]: ByteTransport::read_byte
/// [`now_millis`]: ByteTransport::now_millis
#[async_trait]
pub trait ByteTransport: Send {
    /// Open the link
    async fn connect(&mut self) -> Result<()>;

    /// Close the link
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Write raw bytes
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Write a single byte
    async fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write(&[byte]).await
    }

    /// Number of bytes that can be read without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one buffered byte
    ///
    /// Returns [`Error::Empty`] if nothing is buffered.
    fn read_byte(&mut self) -> Result<u8>;

    /// Monotonic clock in milliseconds
    fn now_millis(&self) -> u64;

    /// Change the link speed after the module switched its baud rate
    ///
    /// Links without a baud rate accept any value.
    fn set_baud_rate(&mut self, _baud_rate: u32) -> Result<()> {
        Ok(())
    }

    /// Human-readable endpoint name
    fn name(&self) -> String;
}
