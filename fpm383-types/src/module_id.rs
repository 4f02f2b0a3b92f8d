//! Module identification

use std::fmt;

use crate::error::{require, Result};

/// Module id string reported by the maintenance command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleId(String);

impl ModuleId {
    pub const LEN: usize = 16;

    /// Parse the fixed 16-byte id field, dropping NUL padding
    pub fn parse(data: &[u8]) -> Result<Self> {
        require("module id", data, Self::LEN)?;

        let id: Vec<u8> = data[..Self::LEN]
            .iter()
            .copied()
            .filter(|&b| b != 0)
            .collect();

        Ok(Self(String::from_utf8_lossy(&id).into_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
