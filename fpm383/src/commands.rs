//! Module command library
//!
//! Each command is one request/response exchange that must come back with
//! a success status; anything else is reported as [`Error`]. Response data
//! is parsed into the types from `fpm383-types`.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info};

use fpm383_core::{
    constants::{
        enroll::{MAX_COUNT, MIN_COUNT},
        FINGER_POLL_INTERVAL_MS,
    },
    CommandPair,
};
use fpm383_types::{
    AutoEnroll, EnrollProgress, EnrollStatus, LedSettings, MatchResult, ModuleId,
};

use crate::device::Device;
use crate::error::{Error, Result};

/// Pause around a baud-rate switch while the module reconfigures its UART
const BAUD_SWITCH_DELAY_MS: u64 = 100;

/// Delete a single template
const DELETE_SINGLE: u8 = 0x00;
/// Delete every template
const DELETE_ALL: u8 = 0x01;

impl Device {
    /// Send a command and return its data, failing on a non-success status
    async fn execute(&mut self, command: CommandPair, data: &[u8]) -> Result<Bytes> {
        let response = self.request(command, data).await?;
        Ok(response.into_result()?)
    }

    /// Run a command whose response carries no data
    async fn execute_ok(&mut self, command: CommandPair, data: &[u8]) -> Result<()> {
        self.execute(command, data).await?;
        Ok(())
    }

    /// Run a command whose response is a single yes/no byte
    async fn execute_flag(&mut self, what: &'static str, command: CommandPair, data: &[u8]) -> Result<bool> {
        let data = self.execute(command, data).await?;

        match data.first() {
            Some(&flag) => Ok(flag == 1),
            None => Err(fpm383_types::Error::TooShort {
                what,
                expected: 1,
                actual: 0,
            }
            .into()),
        }
    }

    // Maintenance commands

    /// Check that the module is alive
    pub async fn heartbeat(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::HEARTBEAT, &[]).await
    }

    /// Read the module's 16-character identifier
    pub async fn module_id(&mut self) -> Result<ModuleId> {
        let data = self.execute(CommandPair::GET_MODULE_ID, &[]).await?;
        Ok(ModuleId::parse(&data)?)
    }

    /// Switch the module's UART to `baud_rate`, then follow on the host side
    ///
    /// The response is sent at the old rate; the transport is only
    /// reconfigured once the module has accepted the change.
    pub async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.execute_ok(CommandPair::SET_BAUD_RATE, &baud_rate.to_be_bytes())
            .await?;

        tokio::time::sleep(Duration::from_millis(BAUD_SWITCH_DELAY_MS)).await;
        self.transport_mut().set_baud_rate(baud_rate)?;
        tokio::time::sleep(Duration::from_millis(BAUD_SWITCH_DELAY_MS)).await;

        info!("Switched to {} baud", baud_rate);
        Ok(())
    }

    // System commands

    /// Change the communication password
    ///
    /// Later requests are stamped with `password` only once the module
    /// has acknowledged the change.
    pub async fn set_password(&mut self, password: u32) -> Result<()> {
        self.execute_ok(CommandPair::SET_PASSWORD, &password.to_be_bytes())
            .await?;

        self.set_password_state(password);
        info!("Communication password updated");
        Ok(())
    }

    /// Restart the module
    pub async fn reset(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::RESET_MODULE, &[]).await
    }

    /// Number of stored templates
    pub async fn template_count(&mut self) -> Result<u16> {
        let data = self.execute(CommandPair::GET_TEMPLATE_COUNT, &[]).await?;

        if data.len() < 2 {
            return Err(fpm383_types::Error::TooShort {
                what: "template count",
                expected: 2,
                actual: data.len(),
            }
            .into());
        }

        Ok(u16::from_be_bytes([data[0], data[1]]))
    }

    pub async fn set_sleep_mode(&mut self, mode: u8) -> Result<()> {
        self.execute_ok(CommandPair::SET_SLEEP_MODE, &[mode]).await
    }

    /// Set how many presses a manual enrollment collects (1 to 6)
    ///
    /// # Errors
    ///
    /// Out-of-range counts are rejected before anything is sent.
    pub async fn set_enroll_count(&mut self, count: u8) -> Result<()> {
        if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
            return Err(Error::Types(fpm383_types::Error::Validation(format!(
                "Enroll count must be between {} and {}, got {}",
                MIN_COUNT, MAX_COUNT, count
            ))));
        }

        self.execute_ok(CommandPair::SET_ENROLL_COUNT, &[count]).await
    }

    pub async fn set_led(&mut self, settings: LedSettings) -> Result<()> {
        self.execute_ok(CommandPair::SET_LED, &settings.to_bytes()).await
    }

    // Enrollment

    /// Capture press number `index` of a manual enrollment
    pub async fn start_enrollment(&mut self, index: u8) -> Result<()> {
        self.execute_ok(CommandPair::ENROLL, &[index]).await
    }

    pub async fn query_enrollment(&mut self) -> Result<EnrollStatus> {
        let data = self.execute(CommandPair::QUERY_ENROLL, &[]).await?;
        Ok(EnrollStatus::parse(&data)?)
    }

    /// Store the enrolled template in slot `fingerprint_id`
    pub async fn save_template(&mut self, fingerprint_id: u16) -> Result<()> {
        self.execute_ok(CommandPair::SAVE_TEMPLATE, &fingerprint_id.to_be_bytes())
            .await
    }

    pub async fn query_save(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::QUERY_SAVE, &[]).await
    }

    /// Abort the running enrollment or match
    pub async fn cancel(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::CANCEL, &[]).await
    }

    /// Refresh the stored template of `fingerprint_id` from the last match
    pub async fn update_feature(&mut self, fingerprint_id: u16) -> Result<()> {
        self.execute_ok(CommandPair::UPDATE_FEATURE, &fingerprint_id.to_be_bytes())
            .await
    }

    pub async fn query_update(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::QUERY_UPDATE, &[]).await
    }

    /// Run a complete enrollment on the module
    ///
    /// The module streams a progress update per press and a final one
    /// once the template is saved. Waits up to the configured poll
    /// timeout for the final update.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use fpm383::{AutoEnroll, Device};
    ///
    /// # async fn run(device: &mut Device) -> fpm383::Result<()> {
    /// let progress = device.auto_enroll(AutoEnroll::new(7, 4)).await?;
    /// assert!(progress.is_complete());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn auto_enroll(&mut self, request: AutoEnroll) -> Result<EnrollProgress> {
        debug!(
            fingerprint_id = request.fingerprint_id,
            count = request.enroll_count,
            "Starting auto enrollment"
        );

        let attempt_timeout = self.timeout();
        let outer_timeout = self.poll_timeout();

        let polled = self
            .poll_exchange(
                CommandPair::AUTO_ENROLL,
                &request.to_bytes(),
                attempt_timeout,
                outer_timeout,
                |response| {
                    EnrollProgress::parse(&response.data)
                        .map(|progress| progress.is_complete())
                        .unwrap_or(false)
                },
            )
            .await?;

        let progress = EnrollProgress::parse(&polled.response.data)?;
        info!("Enrolled {} after {} updates", progress, polled.attempts);

        Ok(progress)
    }

    // Matching

    /// Start an asynchronous match; collect it with [`Device::query_match`]
    pub async fn start_match(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::MATCH, &[]).await
    }

    pub async fn query_match(&mut self) -> Result<MatchResult> {
        let data = self.execute(CommandPair::QUERY_MATCH, &[]).await?;
        Ok(MatchResult::parse(&data)?)
    }

    /// Capture and match in one exchange
    pub async fn match_sync(&mut self) -> Result<MatchResult> {
        let data = self.execute(CommandPair::MATCH_SYNC, &[]).await?;
        Ok(MatchResult::parse(&data)?)
    }

    // Template store

    pub async fn delete_fingerprint(&mut self, fingerprint_id: u16) -> Result<()> {
        let [hi, lo] = fingerprint_id.to_be_bytes();
        self.execute_ok(CommandPair::DELETE, &[DELETE_SINGLE, hi, lo])
            .await
    }

    /// Delete every stored template
    pub async fn delete_all(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::DELETE, &[DELETE_ALL, 0x00, 0x01])
            .await
    }

    pub async fn query_delete(&mut self) -> Result<()> {
        self.execute_ok(CommandPair::QUERY_DELETE, &[]).await
    }

    /// Check whether slot `fingerprint_id` holds a template
    pub async fn fingerprint_exists(&mut self, fingerprint_id: u16) -> Result<bool> {
        self.execute_flag(
            "fingerprint exists",
            CommandPair::CHECK_ID_EXIST,
            &fingerprint_id.to_be_bytes(),
        )
        .await
    }

    // Finger presence

    /// Ask the sensor whether a finger is on it
    pub async fn is_finger_present(&mut self) -> Result<bool> {
        self.execute_flag("finger status", CommandPair::CHECK_FINGER_STATUS, &[])
            .await
    }

    /// Wait until a finger is placed; `false` if `timeout` passes first
    pub async fn wait_for_finger(&mut self, timeout: Duration) -> Result<bool> {
        self.wait_for_presence(true, timeout).await
    }

    /// Wait until the finger is lifted; `false` if `timeout` passes first
    pub async fn wait_for_finger_removal(&mut self, timeout: Duration) -> Result<bool> {
        self.wait_for_presence(false, timeout).await
    }

    async fn wait_for_presence(&mut self, present: bool, timeout: Duration) -> Result<bool> {
        let start = self.now_millis();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

        while self.now_millis().saturating_sub(start) < timeout_ms {
            if self.is_finger_present().await? == present {
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_millis(FINGER_POLL_INTERVAL_MS)).await;
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpm383_core::{Envelope, ErrorKind, PeerStatus};
    use fpm383_transport::{MemoryPeer, MemoryTransport};
    use fpm383_types::{LedColor, LedMode};
    use pretty_assertions::assert_eq;

    fn device() -> (Device, MemoryPeer) {
        let (transport, peer) = MemoryTransport::pair();
        (Device::new(transport), peer)
    }

    fn reply(peer: &MemoryPeer, command: CommandPair, status: PeerStatus, data: &[u8]) {
        peer.push(&Envelope::response(0, command, status, data).encode().unwrap());
    }

    /// Decode the single request the host wrote
    fn sent(peer: &MemoryPeer) -> Envelope {
        let frame = peer.take_written();
        Envelope::decode(&frame[11..]).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_module_id() {
        let (mut device, peer) = device();
        let mut data = [0u8; 16];
        data[..8].copy_from_slice(b"FPM383F1");
        reply(&peer, CommandPair::GET_MODULE_ID, PeerStatus::Success, &data);

        let id = device.module_id().await.unwrap();
        assert_eq!(id.as_str(), "FPM383F1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_template_count() {
        let (mut device, peer) = device();
        reply(&peer, CommandPair::GET_TEMPLATE_COUNT, PeerStatus::Success, &[0x01, 0x2C]);

        assert_eq!(device.template_count().await.unwrap(), 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_template_count_short_data() {
        let (mut device, peer) = device();
        reply(&peer, CommandPair::GET_TEMPLATE_COUNT, PeerStatus::Success, &[0x01]);

        let err = device.template_count().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peer_error_surfaces() {
        let (mut device, peer) = device();
        reply(&peer, CommandPair::RESET_MODULE, PeerStatus::SystemBusy, &[]);

        let err = device.reset().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Peer);
        assert_eq!(err.peer_status(), Some(PeerStatus::SystemBusy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_led_request() {
        let (mut device, peer) = device();
        reply(&peer, CommandPair::SET_LED, PeerStatus::Success, &[]);

        let settings = LedSettings::new(LedMode::Blink, LedColor::RED | LedColor::BLUE)
            .with_params(10, 20, 3);
        device.set_led(settings).await.unwrap();

        let request = sent(&peer);
        assert_eq!(request.command, CommandPair::SET_LED);
        assert_eq!(request.data.as_ref(), &settings.to_bytes());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_requests() {
        let (mut device, peer) = device();

        reply(&peer, CommandPair::DELETE, PeerStatus::Success, &[]);
        device.delete_fingerprint(0x0203).await.unwrap();
        assert_eq!(sent(&peer).data.as_ref(), &[0x00, 0x02, 0x03]);

        reply(&peer, CommandPair::DELETE, PeerStatus::Success, &[]);
        device.delete_all().await.unwrap();
        assert_eq!(sent(&peer).data.as_ref(), &[0x01, 0x00, 0x01]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fingerprint_exists() {
        let (mut device, peer) = device();

        reply(&peer, CommandPair::CHECK_ID_EXIST, PeerStatus::Success, &[1, 0, 0]);
        assert!(device.fingerprint_exists(5).await.unwrap());
        assert_eq!(sent(&peer).data.as_ref(), &[0x00, 0x05]);

        reply(&peer, CommandPair::CHECK_ID_EXIST, PeerStatus::Success, &[0]);
        assert!(!device.fingerprint_exists(5).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_match_sync() {
        let (mut device, peer) = device();
        reply(
            &peer,
            CommandPair::MATCH_SYNC,
            PeerStatus::Success,
            &[0x00, 0x00, 0x64, 0x00, 0x00, 0x07],
        );

        let result = device.match_sync().await.unwrap();
        assert!(result.matched);
        assert_eq!(result.score, 100);
        assert_eq!(result.fingerprint_id, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_enrollment() {
        let (mut device, peer) = device();
        reply(&peer, CommandPair::QUERY_ENROLL, PeerStatus::Success, &[0x00, 0x03, 100]);

        let status = device.query_enrollment().await.unwrap();
        assert_eq!(status.fingerprint_id, 3);
        assert!(status.is_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_baud_rate_follows_module() {
        let (mut device, peer) = device();
        reply(&peer, CommandPair::SET_BAUD_RATE, PeerStatus::Success, &[]);

        device.set_baud_rate(115_200).await.unwrap();

        assert_eq!(sent(&peer).data.as_ref(), &115_200u32.to_be_bytes());
        assert_eq!(peer.baud_rate(), Some(115_200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_baud_rate_rejected_keeps_rate() {
        let (mut device, peer) = device();
        reply(&peer, CommandPair::SET_BAUD_RATE, PeerStatus::InvalidData, &[]);

        assert!(device.set_baud_rate(9_600).await.is_err());
        assert_eq!(peer.baud_rate(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_finger() {
        let (mut device, peer) = device();

        let mut checks = 0;
        peer.respond_with(move |_| {
            checks += 1;
            let present = u8::from(checks >= 3);
            Envelope::response(0, CommandPair::CHECK_FINGER_STATUS, PeerStatus::Success, &[present])
                .encode()
                .unwrap()
                .to_vec()
        });

        assert!(device.wait_for_finger(Duration::from_secs(1)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_finger_removal_gives_up() {
        let (mut device, peer) = device();
        peer.respond_with(|_| {
            Envelope::response(0, CommandPair::CHECK_FINGER_STATUS, PeerStatus::Success, &[1])
                .encode()
                .unwrap()
                .to_vec()
        });

        let removed = device
            .wait_for_finger_removal(Duration::from_millis(200))
            .await
            .unwrap();
        assert!(!removed);
    }
}
