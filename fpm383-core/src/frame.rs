//! FPM383 frame structure and envelope encoding/decoding

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    command::CommandPair,
    constants::{FRAME_HEADER_SIZE, MARKER, MAX_DATA_SIZE, REQUEST_OVERHEAD, RESPONSE_OVERHEAD},
    error::{Error, Result},
    status::PeerStatus,
};

/// Size of the status word that opens every response envelope
const STATUS_SIZE: usize = RESPONSE_OVERHEAD - REQUEST_OVERHEAD;

/// Envelope carried inside a frame
///
/// # Frame Structure
///
/// ```text
/// ┌──────────┬──────────┬──────────┬──────────┬─────────┬──────────┬──────────┐
/// │  Marker  │  Length  │ Frame CS │ Password │ Command │   Data   │ Checksum │
/// │ 8 bytes  │ (BE u16) │  1 byte  │ (BE u32) │ 2 bytes │ N bytes  │  1 byte  │
/// └──────────┴──────────┴──────────┴──────────┴─────────┴──────────┴──────────┘
///                                  └──────────── envelope (Length bytes) ─────┘
/// ```
///
/// All multi-byte values are big-endian. On responses the first four data
/// bytes are the module's status word (see [`Response`]).
///
/// # Examples
///
/// ```
/// use fpm383_core::{CommandPair, Envelope};
///
/// let envelope = Envelope::new(0, CommandPair::HEARTBEAT);
/// let frame = envelope.encode().unwrap();
/// assert_eq!(frame.len(), 11 + envelope.encoded_len());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Communication password stamped by the host
    pub password: u32,

    /// Command identity
    pub command: CommandPair,

    /// Command-specific data
    pub data: Bytes,
}

impl Envelope {
    /// Create an envelope with no data
    pub fn new(password: u32, command: CommandPair) -> Self {
        Self {
            password,
            command,
            data: Bytes::new(),
        }
    }

    /// Create an envelope with data
    pub fn with_data(password: u32, command: CommandPair, data: impl Into<Bytes>) -> Self {
        Self {
            password,
            command,
            data: data.into(),
        }
    }

    /// Create a response-shaped envelope (status word followed by data)
    ///
    /// This is what a module sends back; the driver uses it to simulate
    /// a peer.
    pub fn response(password: u32, command: CommandPair, status: PeerStatus, data: &[u8]) -> Self {
        let mut body = BytesMut::with_capacity(4 + data.len());
        body.put_u32(status.code());
        body.put_slice(data);

        Self::with_data(password, command, body.freeze())
    }

    /// Reject data that cannot be described by the 16-bit length field
    pub fn check_data_len(len: usize) -> Result<()> {
        if len > MAX_DATA_SIZE {
            return Err(Error::PayloadTooLarge {
                size: len,
                max: MAX_DATA_SIZE,
            });
        }
        Ok(())
    }

    /// Envelope length as written in the frame header
    pub fn encoded_len(&self) -> usize {
        REQUEST_OVERHEAD + self.data.len()
    }

    /// Checksum over password, command and data
    pub fn checksum(&self) -> u8 {
        let mut covered = Vec::with_capacity(self.encoded_len() - 1);
        self.put_body(&mut covered);
        checksum::payload(&covered)
    }

    fn put_body(&self, buf: &mut impl BufMut) {
        buf.put_u32(self.password);
        buf.put_slice(&self.command.to_bytes());
        buf.put_slice(&self.data);
    }

    /// Encode the complete frame: header followed by this envelope
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the data does not fit the
    /// 16-bit length field.
    pub fn encode(&self) -> Result<BytesMut> {
        Self::check_data_len(self.data.len())?;

        let length = u16::try_from(self.encoded_len()).map_err(|_| Error::PayloadTooLarge {
            size: self.data.len(),
            max: MAX_DATA_SIZE,
        })?;
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.encoded_len());

        // Frame header
        buf.put_slice(&MARKER);
        buf.put_u16(length);
        buf.put_u8(checksum::frame(length));

        // Envelope
        let body_start = buf.len();
        self.put_body(&mut buf);
        let checksum = checksum::payload(&buf[body_start..]);
        buf.put_u8(checksum);

        Ok(buf)
    }

    /// Decode an envelope (the bytes following the frame header)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The trailing checksum does not match
    /// - Fewer than 7 bytes are present
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Some((&received, covered)) = bytes.split_last() else {
            return Err(Error::EnvelopeTooShort {
                expected: REQUEST_OVERHEAD,
                actual: 0,
            });
        };

        if !checksum::verify_payload(covered, received) {
            return Err(Error::PayloadChecksumMismatch {
                expected: checksum::payload(covered),
                received,
            });
        }

        if bytes.len() < REQUEST_OVERHEAD {
            return Err(Error::EnvelopeTooShort {
                expected: REQUEST_OVERHEAD,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            password: BigEndian::read_u32(&covered[0..4]),
            command: CommandPair::new(covered[4], covered[5]),
            data: Bytes::copy_from_slice(&covered[6..]),
        })
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("password", &format!("0x{:08X}", self.password))
            .field("command", &self.command)
            .field("checksum", &format!("0x{:02X}", self.checksum()))
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Envelope[{}](len={})", self.command, self.data.len())
    }
}

/// Response envelope with its status word split off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Password echoed by the module
    pub password: u32,

    /// Command the module answered
    pub command: CommandPair,

    /// Status reported by the module
    pub status: PeerStatus,

    /// Response data, possibly truncated to the caller's capacity
    pub data: Bytes,

    /// Length of the response data on the wire
    pub wire_len: usize,
}

impl Response {
    /// Fixed envelope overhead of a response
    pub const OVERHEAD: usize = RESPONSE_OVERHEAD;

    /// Keep at most `capacity` data bytes
    pub fn truncate(&mut self, capacity: usize) {
        self.data.truncate(capacity);
    }

    /// True if data was dropped by [`Response::truncate`]
    pub fn is_truncated(&self) -> bool {
        self.data.len() < self.wire_len
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Data of a successful response, or the module's error
    pub fn into_result(self) -> Result<Bytes> {
        if self.status.is_success() {
            Ok(self.data)
        } else {
            Err(Error::Peer {
                command: self.command,
                status: self.status,
            })
        }
    }
}

impl From<Envelope> for Response {
    /// Split the status word off a response envelope
    ///
    /// An envelope shorter than 11 bytes still yields a response: the
    /// status is read from the bytes present, zero-padded to 4 bytes, and
    /// the data is empty.
    fn from(envelope: Envelope) -> Self {
        let split = envelope.data.len().min(STATUS_SIZE);

        let mut word = [0u8; STATUS_SIZE];
        word[..split].copy_from_slice(&envelope.data[..split]);

        let status = PeerStatus::from(BigEndian::read_u32(&word));
        let data = envelope.data.slice(split..);

        Self {
            password: envelope.password,
            command: envelope.command,
            status,
            wire_len: data.len(),
            data,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response[{}](status={}, len={})",
            self.command,
            self.status,
            self.data.len()
        )
    }
}
