//! Per-exchange session state
//!
//! A session lives for exactly one exchange and tracks:
//! - The command pair that was sent
//! - The deadline, on the transport's millisecond clock
//! - The partially assembled response frame
//!
//! Sessions are never shared: the protocol allows one outstanding request
//! at a time.

use std::time::Duration;

use tracing::warn;

use crate::{
    command::CommandPair,
    decoder::FrameDecoder,
    error::{Error, Result, Stage},
    frame::{Envelope, Response},
};

/// State of one request/response exchange
#[derive(Debug, Clone)]
pub struct Session {
    command: CommandPair,
    timeout_ms: u64,
    deadline_ms: u64,
    decoder: FrameDecoder,
}

impl Session {
    /// Start a session at `now_ms` that must finish within `timeout`
    pub fn new(command: CommandPair, now_ms: u64, timeout: Duration) -> Self {
        let timeout_ms = duration_ms(timeout);
        Self {
            command,
            timeout_ms,
            deadline_ms: now_ms.saturating_add(timeout_ms),
            decoder: FrameDecoder::new(),
        }
    }

    /// Command this session expects an answer for
    pub fn command(&self) -> CommandPair {
        self.command
    }

    /// Absolute deadline in transport milliseconds
    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    /// Timeout budget of the current attempt
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Check if the deadline has passed
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// Time left before the deadline
    pub fn remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.deadline_ms.saturating_sub(now_ms))
    }

    /// Start a new receive attempt for the same command
    ///
    /// The attempt gets `timeout` from `now_ms`, but never runs past
    /// `outer_deadline_ms`. Any partial frame is dropped.
    pub fn rearm(&mut self, now_ms: u64, timeout: Duration, outer_deadline_ms: u64) {
        self.deadline_ms = now_ms
            .saturating_add(duration_ms(timeout))
            .min(outer_deadline_ms);
        self.timeout_ms = self.deadline_ms.saturating_sub(now_ms);
        self.decoder.reset();
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
        &mut self.decoder
    }

    /// Timeout error for the stage the decoder is stuck in
    pub fn timeout_error(&self) -> Error {
        Error::Timeout {
            stage: self.decoder.stage(),
            timeout_ms: self.timeout_ms,
        }
    }

    /// Timeout error for a polling exchange that never reached its goal
    pub fn polling_timeout_error(&self, outer_timeout: Duration) -> Error {
        Error::Timeout {
            stage: Stage::Polling,
            timeout_ms: duration_ms(outer_timeout),
        }
    }

    /// Match a decoded envelope against this session's request
    ///
    /// A response for a different command pair is a protocol violation,
    /// whatever status it carries.
    pub fn correlate(&self, envelope: Envelope) -> Result<Response> {
        if envelope.command != self.command {
            warn!(
                expected = %self.command,
                received = %envelope.command,
                "Response does not match request"
            );
            return Err(Error::CommandMismatch {
                expected: self.command,
                received: envelope.command,
            });
        }

        Ok(Response::from(envelope))
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::PeerStatus;

    #[test]
    fn test_session_deadline() {
        let session = Session::new(CommandPair::HEARTBEAT, 1_000, Duration::from_millis(5_000));

        assert_eq!(session.deadline_ms(), 6_000);
        assert!(!session.is_expired(5_999));
        assert!(session.is_expired(6_000));
        assert_eq!(session.remaining(4_000), Duration::from_millis(2_000));
        assert_eq!(session.remaining(7_000), Duration::ZERO);
    }

    #[test]
    fn test_session_deadline_saturates() {
        let session = Session::new(CommandPair::HEARTBEAT, u64::MAX - 10, Duration::from_secs(1));
        assert_eq!(session.deadline_ms(), u64::MAX);
    }

    #[test]
    fn test_session_timeout_error_reports_stage() {
        let mut session = Session::new(CommandPair::HEARTBEAT, 0, Duration::from_millis(100));
        let err = session.timeout_error();
        assert!(matches!(err, Error::Timeout { stage: Stage::Marker, timeout_ms: 100 }));

        for &byte in &crate::constants::MARKER {
            session.decoder_mut().advance(&[byte]).unwrap();
        }
        assert!(matches!(
            session.timeout_error(),
            Error::Timeout { stage: Stage::Length, .. }
        ));
    }

    #[test]
    fn test_session_rearm_is_capped_by_outer_deadline() {
        let mut session = Session::new(CommandPair::AUTO_ENROLL, 0, Duration::from_millis(5_000));

        session.rearm(1_000, Duration::from_millis(5_000), 30_000);
        assert_eq!(session.deadline_ms(), 6_000);
        assert_eq!(session.timeout_ms(), 5_000);

        session.rearm(28_000, Duration::from_millis(5_000), 30_000);
        assert_eq!(session.deadline_ms(), 30_000);
        assert_eq!(session.timeout_ms(), 2_000);
    }

    #[test]
    fn test_correlate_matching_command() {
        let session = Session::new(CommandPair::HEARTBEAT, 0, Duration::from_secs(5));
        let envelope = Envelope::response(0, CommandPair::HEARTBEAT, PeerStatus::Success, &[]);

        let response = session.correlate(envelope).unwrap();
        assert!(response.is_success());
    }

    #[test]
    fn test_correlate_rejects_other_command() {
        let session = Session::new(CommandPair::CANCEL, 0, Duration::from_secs(5));
        let envelope = Envelope::response(0, CommandPair::MATCH, PeerStatus::Success, &[]);

        let err = session.correlate(envelope).unwrap_err();
        assert!(err.is_invalid_data());
        assert!(matches!(
            err,
            Error::CommandMismatch { expected: CommandPair::CANCEL, received: CommandPair::MATCH }
        ));
    }

    #[test]
    fn test_correlate_passes_peer_status_through() {
        let session = Session::new(CommandPair::ENROLL, 0, Duration::from_secs(5));
        let envelope = Envelope::response(0, CommandPair::ENROLL, PeerStatus::PoorImage, &[]);

        let response = session.correlate(envelope).unwrap();
        assert_eq!(response.status, PeerStatus::PoorImage);
    }
}
