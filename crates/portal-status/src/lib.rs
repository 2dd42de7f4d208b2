//! Portal status codes.
//!
//! A status code packs the classification of a service message into a single
//! unsigned 32-bit integer:
//!
//! ```text
//!  byte 0            bytes 1-2            byte 3
//! +--------+-------+---------------------+-----------+
//! | type:4 | grp:4 | message id (BE u16)  | service:8 |
//! +--------+-------+---------------------+-----------+
//! ```
//!
//! The message string is meant for humans, the code for scripts and
//! applications that need to branch on a specific failure.
//!
//! ```rust
//! use portal_status::{StatusCode, GROUP_SECURITY, TYPE_ERROR};
//!
//! let status = StatusCode::new("not authorized")
//!     .with_type(TYPE_ERROR)
//!     .with_group(GROUP_SECURITY)
//!     .with_message_id(0xB00D)
//!     .with_service(0xAA);
//!
//! assert_eq!(status.code(), 0x24B0_0DAA);
//! assert_eq!(status.to_string(), "not authorized (24B00DAA)");
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod codec;
mod status;

pub use codec::{CodeParts, decode, encode, parse_code_str};
pub use status::{ErrorExtensions, ErrorPayload, GraphqlErrorBody, StatusCode};

/// System message group.
pub const GROUP_SYSTEM: u8 = 0x01;
/// Network message group.
pub const GROUP_NETWORK: u8 = 0x02;
/// Input/output message group.
pub const GROUP_IO: u8 = 0x03;
/// Security message group.
pub const GROUP_SECURITY: u8 = 0x04;
/// Activity message group.
pub const GROUP_ACTIVITY: u8 = 0x05;

/// Informational message.
pub const TYPE_INFO: u8 = 0x0;
/// Warning.
pub const TYPE_WARN: u8 = 0x1;
/// Error (the default type).
pub const TYPE_ERROR: u8 = 0x2;
/// Debug message.
pub const TYPE_DEBUG: u8 = 0x9;
