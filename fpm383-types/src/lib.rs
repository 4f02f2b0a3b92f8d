//! Type definitions for fpm383
//!
//! Request parameters and response payloads of the module's commands.

pub mod enroll;
pub mod error;
pub mod led;
pub mod matching;
pub mod module_id;

pub use enroll::{AutoEnroll, EnrollProgress, EnrollStatus};
pub use error::{Error, Result};
pub use led::{LedColor, LedMode, LedSettings};
pub use matching::MatchResult;
pub use module_id::ModuleId;
