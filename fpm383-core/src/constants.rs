//! Protocol constants

/// Frame marker that starts every frame on the wire
pub const MARKER: [u8; 8] = [0xF1, 0x1F, 0xE2, 0x2E, 0xB6, 0x6B, 0xA8, 0x8A];

/// Frame header size: marker + length (u16) + frame checksum
pub const FRAME_HEADER_SIZE: usize = MARKER.len() + 2 + 1;

/// Request envelope overhead: password (4) + command pair (2) + checksum (1)
pub const REQUEST_OVERHEAD: usize = 7;

/// Response envelope overhead: request overhead + status code (4)
pub const RESPONSE_OVERHEAD: usize = 11;

/// Largest data region a request envelope can carry
pub const MAX_DATA_SIZE: usize = u16::MAX as usize - REQUEST_OVERHEAD;

/// Password stamped on envelopes until the module accepts a new one
pub const DEFAULT_PASSWORD: u32 = 0;

/// Default exchange timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default outer timeout for polling exchanges (milliseconds)
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 30_000;

/// Delay between polling attempts (milliseconds)
pub const POLL_DELAY_MS: u64 = 100;

/// Yield between availability checks while assembling a frame (milliseconds)
pub const RECEIVE_POLL_INTERVAL_MS: u64 = 1;

/// Default UART baud rate of the module
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Module start-up time after the port is opened (milliseconds)
pub const STARTUP_DELAY_MS: u64 = 200;

/// Interval between finger presence checks (milliseconds)
pub const FINGER_POLL_INTERVAL_MS: u64 = 50;

/// Auto-enroll progress values
pub mod enroll {
    /// `current_count` value reported once the template has been stored
    pub const SAVED: u8 = 0xFF;

    /// Progress percentage of a finished enrollment
    pub const COMPLETE: u8 = 100;

    /// Allowed range for the enroll count setting
    pub const MIN_COUNT: u8 = 1;
    pub const MAX_COUNT: u8 = 6;
}

/// Fingerprint id the module reports when nothing matched
pub const NO_FINGERPRINT_ID: u16 = 0xFFFF;
