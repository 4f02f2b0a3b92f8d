//! High-level device interface

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use fpm383_core::{
    constants::{
        DEFAULT_PASSWORD, DEFAULT_POLL_TIMEOUT_MS, DEFAULT_TIMEOUT_MS, POLL_DELAY_MS,
        RECEIVE_POLL_INTERVAL_MS, STARTUP_DELAY_MS,
    },
    CommandPair, Envelope, Error as CoreError, Response, Session,
};
use fpm383_transport::{ByteTransport, SerialTransport, TcpTransport};

use crate::error::Result;
use crate::receive::receive_envelope;

/// Terminal response of a polling exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled {
    /// The response that ended the exchange
    pub response: Response,

    /// Receive attempts made, including the terminal one
    pub attempts: usize,
}

/// FPM383 fingerprint module
///
/// Owns the transport and the communication password. Every exchange
/// borrows the device mutably, so one request is in flight at a time.
///
/// # Examples
///
/// ```no_run
/// use fpm383::Device;
///
/// #[tokio::main]
/// async fn main() -> fpm383::Result<()> {
///     let mut device = Device::serial("/dev/ttyUSB0");
///
///     device.connect().await?;
///     println!("Module: {}", device.module_id().await?);
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn ByteTransport>,
    password: u32,
    timeout: Duration,
    poll_timeout: Duration,
    poll_interval: Duration,
    poll_delay: Duration,
}

impl Device {
    /// Create a device on any transport
    pub fn new(transport: impl ByteTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            password: DEFAULT_PASSWORD,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            poll_interval: Duration::from_millis(RECEIVE_POLL_INTERVAL_MS),
            poll_delay: Duration::from_millis(POLL_DELAY_MS),
        }
    }

    /// Create a device on a local serial port (57600 baud)
    pub fn serial(path: impl Into<String>) -> Self {
        Self::new(SerialTransport::new(path))
    }

    /// Create a device behind a serial-over-TCP bridge
    pub fn tcp(addr: impl Into<String>, port: u16) -> Self {
        Self::new(TcpTransport::new(addr, port))
    }

    /// Set the per-exchange timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the outer timeout of polling exchanges
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Set how long frame reception sleeps between availability checks
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the pause between polling attempts
    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Set the communication password the module currently expects
    pub fn with_password(mut self, password: u32) -> Self {
        self.password = password;
        self
    }

    /// Password stamped on outgoing envelopes
    pub fn password(&self) -> u32 {
        self.password
    }

    pub(crate) fn set_password_state(&mut self, password: u32) {
        self.password = password;
    }

    /// Per-exchange timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Outer timeout of polling exchanges
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Check if the transport is open
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub(crate) fn transport_mut(&mut self) -> &mut dyn ByteTransport {
        self.transport.as_mut()
    }

    /// Milliseconds on the transport clock
    pub(crate) fn now_millis(&self) -> u64 {
        self.transport.now_millis()
    }

    /// Open the transport and check that the module answers
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The transport cannot be opened
    /// - The module doesn't answer the heartbeat
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.name());

        if !self.transport.is_connected() {
            self.transport.connect().await?;
        }

        // Module needs a moment after power-up / port open
        tokio::time::sleep(Duration::from_millis(STARTUP_DELAY_MS)).await;

        self.heartbeat().await?;

        info!("Connected to {}", self.transport.name());
        Ok(())
    }

    /// Close the transport
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.name());
        self.transport.disconnect().await?;

        info!("Disconnected");
        Ok(())
    }

    /// Send a command and wait for its response
    ///
    /// Uses the configured timeout and keeps all response data. The
    /// returned response may carry a non-success status; a successful
    /// exchange says nothing about whether the command itself succeeded.
    pub async fn request(&mut self, command: CommandPair, data: &[u8]) -> Result<Response> {
        self.exchange(command, data, usize::MAX, self.timeout).await
    }

    /// Send a command and wait up to `timeout` for its response
    ///
    /// At most `capacity` bytes of response data are kept;
    /// [`Response::wire_len`] still reports the full length.
    ///
    /// # Errors
    ///
    /// - `Timeout` if no complete frame arrives before the deadline
    /// - `InvalidData` on checksum failures or when the response answers a
    ///   different command
    /// - `Transport` if writing the request fails
    pub async fn exchange(
        &mut self,
        command: CommandPair,
        data: &[u8],
        capacity: usize,
        timeout: Duration,
    ) -> Result<Response> {
        let mut session = self.send(command, data, timeout).await?;
        let mut response = self.receive(&mut session).await?;

        if response.data.len() > capacity {
            debug!(
                "Truncating {} response data from {} to {} bytes",
                command,
                response.data.len(),
                capacity
            );
            response.truncate(capacity);
        }

        Ok(response)
    }

    /// Send a command once, then collect responses until `is_terminal`
    ///
    /// Every attempt waits up to `attempt_timeout`, capped by the outer
    /// deadline `outer_timeout` from now. An attempt that times out just
    /// means no update yet; non-terminal responses are dropped. Polling
    /// stops early on invalid data or a non-success status.
    pub async fn poll_exchange<F>(
        &mut self,
        command: CommandPair,
        data: &[u8],
        attempt_timeout: Duration,
        outer_timeout: Duration,
        mut is_terminal: F,
    ) -> Result<Polled>
    where
        F: FnMut(&Response) -> bool + Send,
    {
        let outer_deadline = self
            .now_millis()
            .saturating_add(u64::try_from(outer_timeout.as_millis()).unwrap_or(u64::MAX));

        let mut session = self.send(command, data, attempt_timeout).await?;
        let mut attempts = 0;

        loop {
            let now = self.now_millis();
            if now >= outer_deadline {
                let err = session.polling_timeout_error(outer_timeout);
                warn!(%command, attempts, "{}", err);
                return Err(err.into());
            }

            session.rearm(now, attempt_timeout, outer_deadline);
            attempts += 1;

            match self.receive(&mut session).await {
                Ok(response) => {
                    if !response.is_success() {
                        warn!(%command, status = %response.status, "Polling ended by module error");
                        return Err(CoreError::Peer {
                            command,
                            status: response.status,
                        }
                        .into());
                    }

                    if is_terminal(&response) {
                        debug!(%command, attempts, "Polling finished");
                        return Ok(Polled { response, attempts });
                    }

                    trace!(%command, attempts, "Progress update: {}", response);
                }
                Err(e) if e.is_timeout() => {
                    trace!(%command, attempts, "No update yet");
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.poll_delay).await;
        }
    }

    /// Encode and write a request; the session's clock starts now
    async fn send(&mut self, command: CommandPair, data: &[u8], timeout: Duration) -> Result<Session> {
        Envelope::check_data_len(data.len())?;

        let session = Session::new(command, self.now_millis(), timeout);
        let envelope = Envelope::with_data(self.password, command, data.to_vec());
        let frame = envelope.encode()?;

        debug!("Sending {}", envelope);
        trace!(frame = %hex::encode(&frame), "Request frame");

        self.transport.write(&frame).await?;

        Ok(session)
    }

    /// Receive and correlate one response for `session`
    async fn receive(&mut self, session: &mut Session) -> Result<Response> {
        let envelope = receive_envelope(self.transport.as_mut(), session, self.poll_interval).await?;
        let response = session.correlate(envelope)?;

        trace!("Received {}", response);

        Ok(response)
    }
}
