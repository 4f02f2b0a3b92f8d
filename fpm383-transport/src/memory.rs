//! In-memory transport
//!
//! A host/module pair of byte queues living in the same process. The host
//! side implements [`ByteTransport`]; the [`MemoryPeer`] handle plays the
//! module: it sees everything the host wrote and decides what the host
//! gets to read.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::{clock::Clock, error::*, ByteTransport};

type Responder = Box<dyn FnMut(&[u8]) -> Vec<u8> + Send>;

#[derive(Default)]
struct Link {
    /// Everything the host wrote
    to_module: Vec<u8>,
    /// Bytes waiting to be read by the host
    to_host: VecDeque<u8>,
    /// Called with every host write; its output is queued for the host
    responder: Option<Responder>,
    baud_rate: Option<u32>,
}

/// Host side of an in-memory link
pub struct MemoryTransport {
    link: Arc<Mutex<Link>>,
    clock: Clock,
    connected: bool,
}

/// Module side of an in-memory link
#[derive(Clone)]
pub struct MemoryPeer {
    link: Arc<Mutex<Link>>,
}

impl MemoryTransport {
    /// Create a connected host/module pair
    ///
    /// # Examples
    ///
    /// ```
    /// use fpm383_transport::MemoryTransport;
    ///
    /// let (transport, peer) = MemoryTransport::pair();
    /// peer.push(&[0xF1, 0x1F]);
    /// assert_eq!(peer.pending(), 2);
    /// # drop(transport);
    /// ```
    pub fn pair() -> (Self, MemoryPeer) {
        let link = Arc::new(Mutex::new(Link::default()));
        let transport = Self {
            link: link.clone(),
            clock: Clock::new(),
            connected: true,
        };
        (transport, MemoryPeer { link })
    }
}

impl MemoryPeer {
    /// Queue bytes for the host to read
    pub fn push(&self, bytes: &[u8]) {
        self.link.lock().to_host.extend(bytes.iter().copied());
    }

    /// Bytes queued for the host but not yet read
    pub fn pending(&self) -> usize {
        self.link.lock().to_host.len()
    }

    /// Copy of everything the host has written so far
    pub fn written(&self) -> Vec<u8> {
        self.link.lock().to_module.clone()
    }

    /// Take everything the host has written so far
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.link.lock().to_module)
    }

    /// Answer every host write with the bytes returned by `responder`
    pub fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<u8> + Send + 'static,
    {
        self.link.lock().responder = Some(Box::new(responder));
    }

    /// Stop answering host writes
    pub fn clear_responder(&self) {
        self.link.lock().responder = None;
    }

    /// Last baud rate the host switched to, if any
    pub fn baud_rate(&self) -> Option<u32> {
        self.link.lock().baud_rate
    }
}

#[async_trait]
impl ByteTransport for MemoryTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        trace!("Writing {} bytes to memory link", data.len());

        let mut guard = self.link.lock();
        let link = &mut *guard;
        link.to_module.extend_from_slice(data);

        if let Some(responder) = link.responder.as_mut() {
            let reply = responder(data);
            link.to_host.extend(reply);
        }

        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        Ok(self.link.lock().to_host.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.link.lock().to_host.pop_front().ok_or(Error::Empty)
    }

    fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.link.lock().baud_rate = Some(baud_rate);
        Ok(())
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}
