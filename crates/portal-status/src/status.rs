//! The status code value type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::TYPE_ERROR;
use crate::codec::{CodeParts, decode, encode, parse_code_str};

/// A human-readable message together with its packed classification.
///
/// The packed code and the individual components are always consistent:
/// setters on the components re-encode the code, setting the code
/// re-decodes the components.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusCode {
    message: String,
    code: u32,
    parts: CodeParts,
}

impl Default for StatusCode {
    fn default() -> Self {
        Self::new("")
    }
}

impl StatusCode {
    /// Create a status with an error type and all other components zero.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_parts(
            message,
            CodeParts {
                kind: TYPE_ERROR,
                ..CodeParts::default()
            },
        )
    }

    /// Create a status from explicit components.
    #[must_use]
    pub fn from_parts(message: impl Into<String>, parts: CodeParts) -> Self {
        Self {
            message: message.into(),
            code: encode(parts.kind, parts.group, parts.service, parts.message_id),
            parts,
        }
    }

    /// Create a status from an already packed code.
    ///
    /// A zero code carries no information and yields the same value as
    /// [`StatusCode::new`].
    #[must_use]
    pub fn from_code(message: impl Into<String>, code: u32) -> Self {
        let mut status = Self::new(message);
        if code != 0 {
            status.set_code(code);
        }
        status
    }

    /// Create a status from a textual code, see [`parse_code_str`].
    ///
    /// An empty string yields the defaults. Any other input replaces the
    /// code, so text that fails to parse ends up as code `0`.
    #[must_use]
    pub fn from_code_str(message: impl Into<String>, code: &str) -> Self {
        let mut status = Self::new(message);
        if !code.is_empty() {
            status.set_code(parse_code_str(code));
        }
        status
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Packed code.
    #[must_use]
    pub const fn code(&self) -> u32 {
        self.code
    }

    /// Unpacked components.
    #[must_use]
    pub const fn parts(&self) -> CodeParts {
        self.parts
    }

    /// Message type.
    #[must_use]
    pub const fn kind(&self) -> u8 {
        self.parts.kind
    }

    /// Message group.
    #[must_use]
    pub const fn group(&self) -> u8 {
        self.parts.group
    }

    /// Originating service.
    #[must_use]
    pub const fn service(&self) -> u8 {
        self.parts.service
    }

    /// Message sequence number.
    #[must_use]
    pub const fn message_id(&self) -> u16 {
        self.parts.message_id
    }

    /// Replace the packed code and re-derive the components.
    pub const fn set_code(&mut self, code: u32) {
        self.code = code;
        self.parts = decode(code);
    }

    /// Set the message type.
    #[must_use]
    pub const fn with_type(mut self, kind: u8) -> Self {
        self.parts.kind = kind & 0x0F;
        self.reencode()
    }

    /// Set the message group.
    #[must_use]
    pub const fn with_group(mut self, group: u8) -> Self {
        self.parts.group = group & 0x0F;
        self.reencode()
    }

    /// Set the originating service.
    #[must_use]
    pub const fn with_service(mut self, service: u8) -> Self {
        self.parts.service = service;
        self.reencode()
    }

    /// Set the message sequence number.
    #[must_use]
    pub const fn with_message_id(mut self, message_id: u16) -> Self {
        self.parts.message_id = message_id;
        self.reencode()
    }

    const fn reencode(mut self) -> Self {
        let p = self.parts;
        self.code = encode(p.kind, p.group, p.service, p.message_id);
        self
    }

    /// Mirror this status as a GraphQL error response body.
    ///
    /// Useful for mock servers and tests that need to answer like the API.
    #[must_use]
    pub fn to_error_payload(&self) -> ErrorPayload {
        ErrorPayload {
            errors: vec![GraphqlErrorBody {
                message: self.message.clone(),
                extensions: Some(ErrorExtensions {
                    code: serde_json::Value::from(self.code),
                    detail: None,
                }),
            }],
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.message_id == 0 {
            if self.message.is_empty() {
                return f.write_str("invalid message");
            }
            return f.write_str(&self.message);
        }
        write!(f, "{} ({:X})", self.message, self.code)
    }
}

/// GraphQL error response body: `{"errors": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Reported errors; consumers only look at the first one.
    pub errors: Vec<GraphqlErrorBody>,
}

/// A single entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorBody {
    /// Human-readable message.
    pub message: String,
    /// Machine-readable extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<ErrorExtensions>,
}

/// The `extensions` member of a GraphQL error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorExtensions {
    /// Status code, as number or string.
    #[serde(default)]
    pub code: serde_json::Value,
    /// Additional detail appended to the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
