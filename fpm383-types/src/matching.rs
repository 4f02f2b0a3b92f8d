//! Match payloads

use std::fmt;

use byteorder::{BigEndian, ByteOrder};
use fpm383_core::constants::NO_FINGERPRINT_ID;

use crate::error::{require, Result};

/// Outcome of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    pub fingerprint_id: u16,
    pub score: u16,
}

impl MatchResult {
    pub const LEN: usize = 6;

    /// Parse match data: score at bytes 1..3, id at bytes 4..6
    ///
    /// A match needs a non-zero score and a real template id.
    pub fn parse(data: &[u8]) -> Result<Self> {
        require("match result", data, Self::LEN)?;

        let score = BigEndian::read_u16(&data[1..3]);
        let fingerprint_id = BigEndian::read_u16(&data[4..6]);

        Ok(Self {
            matched: score > 0 && fingerprint_id != NO_FINGERPRINT_ID,
            fingerprint_id,
            score,
        })
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matched {
            write!(f, "Match[id={}](score={})", self.fingerprint_id, self.score)
        } else {
            f.write_str("NoMatch")
        }
    }
}
