//! Command identities
//!
//! Every envelope carries a command pair: a category byte (`cmd1`) and an
//! operation byte (`cmd2`). Responses echo the pair of the request they
//! answer, which is how a response is correlated with its request.

use std::fmt;

use crate::error::{Error, Result};

/// Command category (`cmd1`)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Category {
    Fingerprint = 0x01,
    System = 0x02,
    Maintenance = 0x03,
}

impl TryFrom<u8> for Category {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Fingerprint),
            0x02 => Ok(Self::System),
            0x03 => Ok(Self::Maintenance),
            other => Err(Error::UnknownCategory(other)),
        }
    }
}

impl From<Category> for u8 {
    fn from(category: Category) -> u8 {
        category as u8
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fingerprint => "fingerprint",
            Self::System => "system",
            Self::Maintenance => "maintenance",
        };
        f.write_str(name)
    }
}

/// A `(cmd1, cmd2)` command identity
///
/// The core never interprets the pair beyond comparing a response's pair
/// against the request's; the associated constants exist for the command
/// library built on top.
///
/// # Examples
///
/// ```
/// use fpm383_core::CommandPair;
///
/// let heartbeat = CommandPair::HEARTBEAT;
/// assert_eq!(heartbeat.to_bytes(), [0x03, 0x03]);
/// assert_eq!(heartbeat, CommandPair::new(0x03, 0x03));
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CommandPair {
    /// Command category
    pub cmd1: u8,

    /// Operation within the category
    pub cmd2: u8,
}

impl CommandPair {
    // Fingerprint commands
    pub const ENROLL: Self = Self::fingerprint(0x11);
    pub const QUERY_ENROLL: Self = Self::fingerprint(0x12);
    pub const SAVE_TEMPLATE: Self = Self::fingerprint(0x13);
    pub const QUERY_SAVE: Self = Self::fingerprint(0x14);
    pub const CANCEL: Self = Self::fingerprint(0x15);
    pub const UPDATE_FEATURE: Self = Self::fingerprint(0x16);
    pub const QUERY_UPDATE: Self = Self::fingerprint(0x17);
    pub const AUTO_ENROLL: Self = Self::fingerprint(0x18);
    pub const MATCH: Self = Self::fingerprint(0x21);
    pub const QUERY_MATCH: Self = Self::fingerprint(0x22);
    pub const MATCH_SYNC: Self = Self::fingerprint(0x23);
    pub const DELETE: Self = Self::fingerprint(0x31);
    pub const QUERY_DELETE: Self = Self::fingerprint(0x32);
    pub const CHECK_ID_EXIST: Self = Self::fingerprint(0x33);
    pub const GET_STORAGE_INFO: Self = Self::fingerprint(0x34);
    pub const CHECK_FINGER_STATUS: Self = Self::fingerprint(0x35);
    pub const DELETE_SYNC: Self = Self::fingerprint(0x36);
    pub const CONFIRM_ENROLL: Self = Self::fingerprint(0x41);
    pub const QUERY_CONFIRM: Self = Self::fingerprint(0x42);

    // System commands
    pub const SET_PASSWORD: Self = Self::system(0x01);
    pub const RESET_MODULE: Self = Self::system(0x02);
    pub const GET_TEMPLATE_COUNT: Self = Self::system(0x03);
    pub const GET_GAIN: Self = Self::system(0x09);
    pub const GET_THRESHOLD: Self = Self::system(0x0B);
    pub const SET_SLEEP_MODE: Self = Self::system(0x0C);
    pub const SET_ENROLL_COUNT: Self = Self::system(0x0D);
    pub const SET_LED: Self = Self::system(0x0F);
    pub const GET_POLICY: Self = Self::system(0xFB);
    pub const SET_POLICY: Self = Self::system(0xFC);

    // Maintenance commands
    pub const GET_MODULE_ID: Self = Self::maintenance(0x01);
    pub const HEARTBEAT: Self = Self::maintenance(0x03);
    pub const SET_BAUD_RATE: Self = Self::maintenance(0x04);
    pub const SET_COMM_PASSWORD: Self = Self::maintenance(0x05);

    /// Create a command pair from raw bytes
    pub const fn new(cmd1: u8, cmd2: u8) -> Self {
        Self { cmd1, cmd2 }
    }

    const fn fingerprint(cmd2: u8) -> Self {
        Self::new(Category::Fingerprint as u8, cmd2)
    }

    const fn system(cmd2: u8) -> Self {
        Self::new(Category::System as u8, cmd2)
    }

    const fn maintenance(cmd2: u8) -> Self {
        Self::new(Category::Maintenance as u8, cmd2)
    }

    /// Wire representation `[cmd1, cmd2]`
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.cmd1, self.cmd2]
    }

    /// Category of this command, if `cmd1` is a known category
    pub fn category(self) -> Result<Category> {
        Category::try_from(self.cmd1)
    }
}

impl From<[u8; 2]> for CommandPair {
    fn from(bytes: [u8; 2]) -> Self {
        Self::new(bytes[0], bytes[1])
    }
}

impl fmt::Display for CommandPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}/0x{:02X}", self.cmd1, self.cmd2)
    }
}
