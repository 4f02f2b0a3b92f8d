//! Error types for fpm383-core

use std::fmt;

use crate::command::CommandPair;
use crate::status::PeerStatus;

/// Result type alias for fpm383 operations
pub type Result<T> = std::result::Result<T, Error>;

/// Frame assembly stage, reported with timeouts
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Searching for the frame marker
    Marker,
    /// Waiting for the 2-byte length field
    Length,
    /// Waiting for the frame checksum byte
    FrameChecksum,
    /// Waiting for the envelope bytes
    Payload,
    /// Polling for a terminal response of a multi-response exchange
    Polling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Marker => "marker",
            Self::Length => "length",
            Self::FrameChecksum => "frame checksum",
            Self::Payload => "payload",
            Self::Polling => "polling",
        };
        f.write_str(name)
    }
}

/// Coarse error classification
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Frame assembly did not finish before the deadline
    Timeout,
    /// Checksum failure, malformed envelope or mismatched command pair
    InvalidData,
    /// Frame exchange succeeded but the module reported a failure
    Peer,
    /// Request rejected before anything was sent
    InvalidInput,
    /// The byte transport failed
    Transport,
}

/// Core protocol errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Deadline elapsed while assembling a frame
    #[error("Timeout waiting for {stage} after {timeout_ms}ms")]
    Timeout {
        stage: Stage,
        timeout_ms: u64,
    },

    /// Frame header checksum verification failed
    #[error("Frame checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    FrameChecksumMismatch {
        expected: u8,
        received: u8,
    },

    /// Envelope checksum verification failed
    #[error("Payload checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    PayloadChecksumMismatch {
        expected: u8,
        received: u8,
    },

    /// Envelope is too short to carry password, command and checksum
    #[error("Envelope too short: expected at least {expected} bytes, got {actual} bytes")]
    EnvelopeTooShort {
        expected: usize,
        actual: usize,
    },


    /// Response answers a different command than the one requested
    #[error("Command mismatch: expected {expected}, received {received}")]
    CommandMismatch {
        expected: CommandPair,
        received: CommandPair,
    },

    /// Module reported a non-success status
    #[error("Module returned error for {command}: {status}")]
    Peer {
        command: CommandPair,
        status: PeerStatus,
    },

    /// Request data does not fit in the length field
    #[error("Payload too large: {size} bytes (max: {max} bytes)")]
    PayloadTooLarge {
        size: usize,
        max: usize,
    },

    /// Unknown command category
    #[error("Unknown command category: 0x{0:02X}")]
    UnknownCategory(u8),

    /// Decoder fed a chunk of the wrong size for its stage
    #[error("Decoder in {stage} stage needs {expected} bytes, got {actual}")]
    ChunkSize {
        stage: Stage,
        expected: usize,
        actual: usize,
    },
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::FrameChecksumMismatch { .. }
            | Self::PayloadChecksumMismatch { .. }
            | Self::EnvelopeTooShort { .. }
            | Self::CommandMismatch { .. } => ErrorKind::InvalidData,
            Self::Peer { .. } => ErrorKind::Peer,
            Self::PayloadTooLarge { .. }
            | Self::UnknownCategory(_)
            | Self::ChunkSize { .. } => ErrorKind::InvalidInput,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    pub fn is_invalid_data(&self) -> bool {
        self.kind() == ErrorKind::InvalidData
    }

    /// Status reported by the module, if this is a peer error
    pub fn peer_status(&self) -> Option<PeerStatus> {
        match self {
            Self::Peer { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if error is recoverable (a fresh exchange might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::FrameChecksumMismatch { .. }
                | Self::PayloadChecksumMismatch { .. }
                | Self::Peer {
                    status: PeerStatus::SystemBusy | PeerStatus::Timeout,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let timeout = Error::Timeout { stage: Stage::Marker, timeout_ms: 5000 };
        assert!(timeout.is_timeout());
        assert!(timeout.is_recoverable());

        let mismatch = Error::CommandMismatch {
            expected: CommandPair::CANCEL,
            received: CommandPair::MATCH,
        };
        assert!(mismatch.is_invalid_data());
        assert!(!mismatch.is_recoverable());

        let peer = Error::Peer {
            command: CommandPair::HEARTBEAT,
            status: PeerStatus::SystemBusy,
        };
        assert_eq!(peer.kind(), ErrorKind::Peer);
        assert_eq!(peer.peer_status(), Some(PeerStatus::SystemBusy));
        assert!(peer.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Timeout { stage: Stage::FrameChecksum, timeout_ms: 250 };
        assert_eq!(err.to_string(), "Timeout waiting for frame checksum after 250ms");

        let err = Error::CommandMismatch {
            expected: CommandPair::CANCEL,
            received: CommandPair::MATCH,
        };
        assert_eq!(
            err.to_string(),
            "Command mismatch: expected 0x01/0x15, received 0x01/0x21"
        );
    }
}
