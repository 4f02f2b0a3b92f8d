//! High-level error types

use fpm383_core::{ErrorKind, PeerStatus};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] fpm383_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] fpm383_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] fpm383_types::Error),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Transport(_) => ErrorKind::Transport,
            Self::Types(fpm383_types::Error::Validation(_)) => ErrorKind::InvalidInput,
            Self::Types(fpm383_types::Error::TooShort { .. }) => ErrorKind::InvalidData,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    pub fn is_invalid_data(&self) -> bool {
        self.kind() == ErrorKind::InvalidData
    }

    /// Worth retrying the same exchange
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Core(e) => e.is_recoverable(),
            _ => false,
        }
    }

    /// Status reported by the module, if the module rejected the command
    pub fn peer_status(&self) -> Option<PeerStatus> {
        match self {
            Self::Core(e) => e.peer_status(),
            _ => None,
        }
    }
}
