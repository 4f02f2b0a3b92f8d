//! Peer status codes
//!
//! The 32-bit status word a module returns in every response envelope.
//! A well-formed response with a non-success status is still a successful
//! frame exchange; interpreting the status is left to the caller.

use std::fmt;

/// Status reported by the module
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PeerStatus {
    Success,
    UnknownCommand,
    InvalidLength,
    InvalidData,
    SystemBusy,
    NoRequest,
    SoftwareError,
    HardwareError,
    Timeout,
    ExtractionError,
    TemplateEmpty,
    StorageFull,
    WriteFailed,
    ReadFailed,
    PoorImage,
    Duplicate,
    SmallArea,
    /// Code not known to this driver, passed through verbatim
    Other(u32),
}

impl PeerStatus {
    /// Raw status code
    pub fn code(self) -> u32 {
        match self {
            Self::Success => 0x00,
            Self::UnknownCommand => 0x01,
            Self::InvalidLength => 0x02,
            Self::InvalidData => 0x03,
            Self::SystemBusy => 0x04,
            Self::NoRequest => 0x05,
            Self::SoftwareError => 0x06,
            Self::HardwareError => 0x07,
            Self::Timeout => 0x08,
            Self::ExtractionError => 0x09,
            Self::TemplateEmpty => 0x0A,
            Self::StorageFull => 0x0B,
            Self::WriteFailed => 0x0C,
            Self::ReadFailed => 0x0D,
            Self::PoorImage => 0x0E,
            Self::Duplicate => 0x0F,
            Self::SmallArea => 0x10,
            Self::Other(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Human-readable description
    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::UnknownCommand => "Unknown command",
            Self::InvalidLength => "Invalid data length",
            Self::InvalidData => "Invalid data",
            Self::SystemBusy => "System busy",
            Self::NoRequest => "No request sent",
            Self::SoftwareError => "Software error",
            Self::HardwareError => "Hardware error",
            Self::Timeout => "Timeout",
            Self::ExtractionError => "Feature extraction error",
            Self::TemplateEmpty => "Template library empty",
            Self::StorageFull => "Storage full",
            Self::WriteFailed => "Write failed",
            Self::ReadFailed => "Read failed",
            Self::PoorImage => "Poor image quality",
            Self::Duplicate => "Duplicate fingerprint",
            Self::SmallArea => "Finger area too small",
            Self::Other(_) => "Unknown error",
        }
    }
}

impl From<u32> for PeerStatus {
    fn from(code: u32) -> Self {
        match code {
            0x00 => Self::Success,
            0x01 => Self::UnknownCommand,
            0x02 => Self::InvalidLength,
            0x03 => Self::InvalidData,
            0x04 => Self::SystemBusy,
            0x05 => Self::NoRequest,
            0x06 => Self::SoftwareError,
            0x07 => Self::HardwareError,
            0x08 => Self::Timeout,
            0x09 => Self::ExtractionError,
            0x0A => Self::TemplateEmpty,
            0x0B => Self::StorageFull,
            0x0C => Self::WriteFailed,
            0x0D => Self::ReadFailed,
            0x0E => Self::PoorImage,
            0x0F => Self::Duplicate,
            0x10 => Self::SmallArea,
            other => Self::Other(other),
        }
    }
}

impl From<PeerStatus> for u32 {
    fn from(status: PeerStatus) -> u32 {
        status.code()
    }
}

impl fmt::Display for PeerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Unknown error: 0x{:X}", code),
            known => f.write_str(known.description()),
        }
    }
}
