//! Deadline-bounded frame reception
//!
//! Drives the core [`FrameDecoder`](fpm383_core::FrameDecoder) against a
//! transport until a frame is complete or the session's deadline passes.

use std::time::Duration;

use tracing::debug;

use fpm383_core::{Envelope, Session, Stage};
use fpm383_transport::ByteTransport;

use crate::error::Result;

/// Assemble one envelope for `session`
///
/// Marker sync re-checks the deadline before every byte. Later stages
/// read as soon as the bytes they need are buffered and time out once the
/// deadline has passed without them. Between checks the task sleeps for
/// `poll_interval`.
pub(crate) async fn receive_envelope(
    transport: &mut dyn ByteTransport,
    session: &mut Session,
    poll_interval: Duration,
) -> Result<Envelope> {
    loop {
        let expired = session.is_expired(transport.now_millis());
        let wanted = session.decoder().wanted();
        let in_marker = session.decoder().stage() == Stage::Marker;

        if transport.bytes_available()? >= wanted && !(in_marker && expired) {
            let mut chunk = Vec::with_capacity(wanted);
            for _ in 0..wanted {
                chunk.push(transport.read_byte()?);
            }

            if let Some(envelope) = session.decoder_mut().advance(&chunk)? {
                return Ok(envelope);
            }
            continue;
        }

        if expired {
            let err = session.timeout_error();
            debug!(command = %session.command(), "{}", err);
            return Err(err.into());
        }

        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fpm383_core::{CommandPair, Error as CoreError, PeerStatus, constants::MARKER};
    use fpm383_transport::MemoryTransport;
    use tokio::time::Instant;

    use crate::Error;

    const POLL: Duration = Duration::from_millis(1);

    fn session(transport: &MemoryTransport, timeout_ms: u64) -> Session {
        Session::new(
            CommandPair::HEARTBEAT,
            transport.now_millis(),
            Duration::from_millis(timeout_ms),
        )
    }

    fn heartbeat_frame() -> Vec<u8> {
        Envelope::response(0, CommandPair::HEARTBEAT, PeerStatus::Success, &[])
            .encode()
            .unwrap()
            .to_vec()
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_buffered_frame() {
        let (mut transport, peer) = MemoryTransport::pair();
        peer.push(&heartbeat_frame());

        let mut session = session(&transport, 100);
        let envelope = receive_envelope(&mut transport, &mut session, POLL).await.unwrap();

        assert_eq!(envelope.command, CommandPair::HEARTBEAT);
        assert_eq!(peer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_times_out_at_deadline() {
        let (mut transport, _peer) = MemoryTransport::pair();
        let mut session = session(&transport, 250);

        let start = Instant::now();
        let err = receive_envelope(&mut transport, &mut session, POLL).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(
            err,
            Error::Core(CoreError::Timeout { stage: Stage::Marker, timeout_ms: 250 })
        ));
        assert!(elapsed >= Duration::from_millis(250), "gave up after {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(260), "gave up after {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_reports_stuck_stage() {
        let (mut transport, peer) = MemoryTransport::pair();
        let frame = heartbeat_frame();

        // Header only, payload never arrives
        peer.push(&frame[..11]);

        let mut session = session(&transport, 100);
        let err = receive_envelope(&mut transport, &mut session, POLL).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Core(CoreError::Timeout { stage: Stage::Payload, .. })
        ));
        assert_eq!(peer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_times_out_waiting_for_length() {
        let (mut transport, peer) = MemoryTransport::pair();
        peer.push(&MARKER);

        let mut session = session(&transport, 200);
        let start = Instant::now();
        let err = receive_envelope(&mut transport, &mut session, POLL).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(
            err,
            Error::Core(CoreError::Timeout { stage: Stage::Length, timeout_ms: 200 })
        ));
        assert!(elapsed >= Duration::from_millis(200), "gave up after {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(210), "gave up after {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_times_out_waiting_for_frame_checksum() {
        let (mut transport, peer) = MemoryTransport::pair();
        let frame = heartbeat_frame();
        peer.push(&frame[..10]);

        let mut session = session(&transport, 200);
        let start = Instant::now();
        let err = receive_envelope(&mut transport, &mut session, POLL).await.unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(
            err,
            Error::Core(CoreError::Timeout { stage: Stage::FrameChecksum, timeout_ms: 200 })
        ));
        assert!(elapsed >= Duration::from_millis(200), "gave up after {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(210), "gave up after {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_length_arriving_late_still_completes() {
        let (mut transport, peer) = MemoryTransport::pair();
        let frame = heartbeat_frame();
        peer.push(&frame[..9]);

        let feeder = peer.clone();
        let rest = frame[9..].to_vec();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            feeder.push(&rest);
        });

        let mut session = session(&transport, 200);
        let envelope = receive_envelope(&mut transport, &mut session, POLL).await.unwrap();
        assert_eq!(envelope.command, CommandPair::HEARTBEAT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_waits_for_whole_payload() {
        let (mut transport, peer) = MemoryTransport::pair();
        let frame = heartbeat_frame();
        peer.push(&frame[..14]);

        let mut session = session(&transport, 100);
        let err = receive_envelope(&mut transport, &mut session, POLL).await.unwrap_err();

        assert!(err.is_timeout());
        // The three payload bytes were never consumed
        assert_eq!(peer.pending(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_assembles_fragments() {
        let (mut transport, peer) = MemoryTransport::pair();
        let frame = heartbeat_frame();

        let feeder = peer.clone();
        tokio::spawn(async move {
            for chunk in frame.chunks(5) {
                tokio::time::sleep(Duration::from_millis(20)).await;
                feeder.push(chunk);
            }
        });

        let mut session = session(&transport, 1_000);
        let envelope = receive_envelope(&mut transport, &mut session, POLL).await.unwrap();
        assert_eq!(envelope.command, CommandPair::HEARTBEAT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_stops_syncing_noise_after_deadline() {
        let (mut transport, peer) = MemoryTransport::pair();
        let mut session = session(&transport, 50);

        tokio::time::sleep(Duration::from_millis(60)).await;
        peer.push(&[0x00, 0x01, MARKER[0]]);

        let err = receive_envelope(&mut transport, &mut session, POLL).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(peer.pending(), 3);
    }
}
