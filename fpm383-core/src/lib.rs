//! # fpm383-core
//!
//! Core protocol implementation for FPM383 fingerprint modules.
//!
//! This crate provides the low-level protocol primitives:
//! - Frame and envelope encoding/decoding
//! - Checksum calculation
//! - Incremental, I/O-free frame decoding
//! - Per-exchange session state and response correlation
//! - Command and status definitions

pub mod checksum;
pub mod command;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod session;
pub mod status;

pub use command::{Category, CommandPair};
pub use decoder::FrameDecoder;
pub use error::{Error, ErrorKind, Result, Stage};
pub use frame::{Envelope, Response};
pub use session::Session;
pub use status::PeerStatus;
