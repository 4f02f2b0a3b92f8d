//! # fpm383
//!
//! Rust driver for the FPM383 fingerprint module's serial protocol.
//!
//! ## Features
//!
//! - Frame codec with marker resynchronization and both checksums
//! - Deadline-bounded request/response exchanges, correlated by command
//! - Multi-response polling for automatic enrollment
//! - Async/await API using Tokio over serial, TCP bridges or memory
//!
//! ## Quick Start
//!
//! ```no_run
//! use fpm383::{AutoEnroll, Device};
//!
//! #[tokio::main]
//! async fn main() -> fpm383::Result<()> {
//!     let mut device = Device::serial("/dev/ttyUSB0");
//!     device.connect().await?;
//!
//!     println!("Templates stored: {}", device.template_count().await?);
//!
//!     let progress = device.auto_enroll(AutoEnroll::new(1, 4)).await?;
//!     println!("{}", progress);
//!
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod device;
pub mod error;
mod receive;

// Re-exports
pub use device::{Device, Polled};
pub use error::{Error, Result};

// Re-export protocol and transport types
pub use fpm383_core::{CommandPair, Envelope, ErrorKind, PeerStatus, Response};
pub use fpm383_transport::{ByteTransport, MemoryPeer, MemoryTransport, SerialTransport, TcpTransport};
pub use fpm383_types::{
    AutoEnroll, EnrollProgress, EnrollStatus, LedColor, LedMode, LedSettings, MatchResult,
    ModuleId,
};
