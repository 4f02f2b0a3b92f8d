//! Incremental frame decoder
//!
//! Frame assembly runs in four stages: marker sync, length, frame checksum
//! and payload. The decoder performs no I/O. The driver asks how many bytes
//! the current stage needs ([`FrameDecoder::wanted`]), waits until that many
//! are available, and hands them over with [`FrameDecoder::advance`].

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace, warn};

use crate::{
    checksum,
    constants::MARKER,
    error::{Error, Result, Stage},
    frame::Envelope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// `matched` marker bytes seen so far
    Marker { matched: usize },
    Length,
    FrameChecksum { length: u16 },
    Payload { length: u16 },
}

/// Sans-IO frame decoder
///
/// After a frame or an error is returned the decoder is back in marker
/// sync, ready for the next frame.
///
/// # Examples
///
/// ```
/// use fpm383_core::{CommandPair, Envelope, FrameDecoder};
///
/// let frame = Envelope::new(0, CommandPair::HEARTBEAT).encode().unwrap();
/// let mut decoder = FrameDecoder::new();
///
/// let mut rest = &frame[..];
/// let envelope = loop {
///     let (chunk, tail) = rest.split_at(decoder.wanted());
///     rest = tail;
///     if let Some(envelope) = decoder.advance(chunk).unwrap() {
///         break envelope;
///     }
/// };
/// assert_eq!(envelope.command, CommandPair::HEARTBEAT);
/// ```
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: State,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Marker { matched: 0 },
        }
    }

    /// Stage the decoder is currently in
    pub fn stage(&self) -> Stage {
        match self.state {
            State::Marker { .. } => Stage::Marker,
            State::Length => Stage::Length,
            State::FrameChecksum { .. } => Stage::FrameChecksum,
            State::Payload { .. } => Stage::Payload,
        }
    }

    /// Number of bytes the current stage consumes in one step
    pub fn wanted(&self) -> usize {
        match self.state {
            State::Marker { .. } => 1,
            State::Length => 2,
            State::FrameChecksum { .. } => 1,
            State::Payload { length } => length as usize,
        }
    }

    /// Number of marker bytes matched so far
    pub fn marker_progress(&self) -> usize {
        match self.state {
            State::Marker { matched } => matched,
            _ => MARKER.len(),
        }
    }

    /// Drop any partial frame and go back to marker sync
    pub fn reset(&mut self) {
        self.state = State::Marker { matched: 0 };
    }

    /// Feed exactly [`FrameDecoder::wanted`] bytes
    ///
    /// Returns `Ok(Some(envelope))` once a complete, checksum-valid frame
    /// has been assembled and `Ok(None)` while more bytes are needed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The frame checksum does not match the length field
    /// - The envelope checksum does not match
    /// - The envelope is too short to be valid
    /// - `bytes.len()` differs from [`FrameDecoder::wanted`]; the decoder
    ///   state is left untouched
    pub fn advance(&mut self, bytes: &[u8]) -> Result<Option<Envelope>> {
        if bytes.len() != self.wanted() {
            return Err(Error::ChunkSize {
                stage: self.stage(),
                expected: self.wanted(),
                actual: bytes.len(),
            });
        }

        match self.state {
            State::Marker { matched } => {
                self.state = State::Marker {
                    matched: Self::sync(matched, bytes[0]),
                };
                if self.marker_progress() == MARKER.len() {
                    trace!("Frame marker found");
                    self.state = State::Length;
                }
                Ok(None)
            }
            State::Length => {
                let length = BigEndian::read_u16(bytes);
                self.state = State::FrameChecksum { length };
                Ok(None)
            }
            State::FrameChecksum { length } => {
                let received = bytes[0];
                if !checksum::verify_frame(length, received) {
                    let expected = checksum::frame(length);
                    warn!(
                        length,
                        expected = format!("0x{:02X}", expected),
                        received = format!("0x{:02X}", received),
                        "Frame checksum mismatch, discarding frame"
                    );
                    self.reset();
                    return Err(Error::FrameChecksumMismatch { expected, received });
                }
                self.state = State::Payload { length };
                Ok(None)
            }
            State::Payload { .. } => {
                self.reset();
                trace!(len = bytes.len(), payload = %hex::encode(bytes), "Received envelope");

                let envelope = Envelope::decode(bytes).inspect_err(|e| {
                    warn!("Discarding envelope: {}", e);
                })?;
                debug!("Decoded {}", envelope);

                Ok(Some(envelope))
            }
        }
    }

    /// Next marker match index after seeing `byte`
    ///
    /// A mismatching byte that equals the first marker byte restarts the
    /// match at index 1 instead of 0.
    fn sync(matched: usize, byte: u8) -> usize {
        if byte == MARKER[matched] {
            matched + 1
        } else if byte == MARKER[0] {
            1
        } else {
            0
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
