//! Enrollment payloads

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use fpm383_core::constants::enroll::{COMPLETE, SAVED};

use crate::error::{require, Result};

/// Parameters of an automatic enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoEnroll {
    /// Slot the template is stored in
    pub fingerprint_id: u16,

    /// Number of presses to collect
    pub enroll_count: u8,

    /// Require the finger to be lifted between presses
    pub wait_finger_lift: bool,
}

impl AutoEnroll {
    pub fn new(fingerprint_id: u16, enroll_count: u8) -> Self {
        Self {
            fingerprint_id,
            enroll_count,
            wait_finger_lift: false,
        }
    }

    pub fn with_finger_lift(mut self, wait: bool) -> Self {
        self.wait_finger_lift = wait;
        self
    }

    /// Request data: `[lift flag, count, id (BE u16)]`
    pub fn to_bytes(self) -> [u8; 4] {
        let id = self.fingerprint_id.to_be_bytes();
        [u8::from(self.wait_finger_lift), self.enroll_count, id[0], id[1]]
    }
}

/// Progress update sent while an automatic enrollment runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollProgress {
    /// Presses collected so far; `0xFF` once the template is saved
    pub current_count: u8,

    /// Slot the template goes to
    pub fingerprint_id: u16,

    /// Percentage complete
    pub progress: u8,
}

impl EnrollProgress {
    pub const LEN: usize = 4;

    pub fn parse(data: &[u8]) -> Result<Self> {
        require("enroll progress", data, Self::LEN)?;

        Ok(Self {
            current_count: data[0],
            fingerprint_id: BigEndian::read_u16(&data[1..3]),
            progress: data[3],
        })
    }

    /// Template saved and progress at 100%
    pub fn is_complete(&self) -> bool {
        self.current_count == SAVED && self.progress == COMPLETE
    }
}

impl fmt::Display for EnrollProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Enroll[id={}](count={}, progress={}%)",
            self.fingerprint_id, self.current_count, self.progress
        )
    }
}

/// Result of querying a manual enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrollStatus {
    pub fingerprint_id: u16,
    pub progress: u8,
}

impl EnrollStatus {
    pub const LEN: usize = 3;

    pub fn parse(data: &[u8]) -> Result<Self> {
        require("enroll status", data, Self::LEN)?;

        Ok(Self {
            fingerprint_id: BigEndian::read_u16(&data[0..2]),
            progress: data[2],
        })
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= COMPLETE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_auto_enroll_request() {
        let request = AutoEnroll::new(0x0102, 6);
        assert_eq!(request.to_bytes(), [0, 6, 0x01, 0x02]);
        assert_eq!(request.with_finger_lift(true).to_bytes(), [1, 6, 0x01, 0x02]);
    }

    #[test]
    fn test_enroll_progress() {
        let update = EnrollProgress::parse(&[2, 0x00, 0x07, 40]).unwrap();
        assert_eq!(update.current_count, 2);
        assert_eq!(update.fingerprint_id, 7);
        assert_eq!(update.progress, 40);
        assert!(!update.is_complete());

        let done = EnrollProgress::parse(&[0xFF, 0x00, 0x07, 100, 0xAA]).unwrap();
        assert!(done.is_complete());

        // Saved marker alone is not enough
        assert!(!EnrollProgress::parse(&[0xFF, 0, 7, 99]).unwrap().is_complete());
    }

    #[test]
    fn test_enroll_progress_too_short() {
        assert!(matches!(
            EnrollProgress::parse(&[0xFF, 0, 7]),
            Err(Error::TooShort { expected: 4, actual: 3, .. })
        ));
    }

    #[test]
    fn test_enroll_status() {
        let status = EnrollStatus::parse(&[0x00, 0x10, 100]).unwrap();
        assert_eq!(status.fingerprint_id, 16);
        assert!(status.is_complete());
        assert!(!EnrollStatus::parse(&[0, 1, 50]).unwrap().is_complete());
        assert!(EnrollStatus::parse(&[0, 1]).is_err());
    }
}
