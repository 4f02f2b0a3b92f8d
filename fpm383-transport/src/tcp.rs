//! TCP transport
//!
//! Reaches a module through a serial-over-TCP bridge (ser2net, an
//! ESP-Link, a terminal server): the bridge forwards the TCP byte stream
//! to the module's UART unchanged.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::{clock::Clock, error::*, ByteTransport};

/// Bytes pulled from the socket per nonblocking read
const READ_CHUNK: usize = 1024;

/// TCP transport for bridged FPM383 modules
pub struct TcpTransport {
    addr: String,
    port: u16,
    socket_addr: Option<SocketAddr>,
    stream: Option<TcpStream>,
    rx: BytesMut,
    eof: bool,
    connect_timeout: Duration,
    clock: Clock,
}

impl TcpTransport {
    /// Create new TCP transport
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            socket_addr: None,
            stream: None,
            rx: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
            connect_timeout: Duration::from_secs(5),
            clock: Clock::new(),
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Resolve address to SocketAddr
    async fn resolve_addr(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.socket_addr {
            return Ok(addr);
        }

        let addr_str = format!("{}:{}", self.addr, self.port);

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .collect();

        let addr = addrs
            .first()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))?;

        self.socket_addr = Some(*addr);
        Ok(*addr)
    }
}

#[async_trait]
impl ByteTransport for TcpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let addr = self.resolve_addr().await?;

        debug!("Connecting to {}...", addr);

        let stream = timeout(self.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)?
            .map_err(Error::Io)?;

        // Frames are small; don't let Nagle hold them back
        stream.set_nodelay(true)?;

        debug!("Connected to {}", addr);

        self.stream = Some(stream);
        self.rx.clear();
        self.eof = false;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!("Disconnecting from {}...", self.name());

            // Graceful shutdown
            let _ = stream.shutdown().await;
        }

        self.socket_addr = None;
        self.rx.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let stream = self.stream.as_ref().ok_or(Error::NotConnected)?;

        while !self.eof {
            self.rx.reserve(READ_CHUNK);
            match stream.try_read_buf(&mut self.rx) {
                Ok(0) => {
                    warn!("Bridge closed the connection");
                    self.eof = true;
                }
                Ok(n) => trace!("Received {} bytes", n),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(Error::Io(e)),
            }
        }

        if self.eof && self.rx.is_empty() {
            return Err(Error::ConnectionClosed);
        }

        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.rx.is_empty() {
            return Err(Error::Empty);
        }
        Ok(self.rx.get_u8())
    }

    fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    fn name(&self) -> String {
        self.socket_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| format!("{}:{}", self.addr, self.port))
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("TCP transport dropped while still connected");
        }
    }
}
