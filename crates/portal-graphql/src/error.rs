//! Error types for the GraphQL client.

use portal_status::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP error information captured from reqwest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorInfo {
    /// Error message.
    pub message: String,
    /// HTTP status code (if available).
    pub status_code: Option<u16>,
    /// Whether the error was a timeout.
    pub is_timeout: bool,
    /// Whether the error was a connection failure.
    pub is_connect: bool,
}

impl HttpErrorInfo {
    /// Error information for a failure that did not come from reqwest.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            is_timeout: false,
            is_connect: false,
        }
    }
}

impl From<reqwest::Error> for HttpErrorInfo {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status_code: err.status().map(|status| status.as_u16()),
            is_timeout: err.is_timeout(),
            is_connect: err.is_connect(),
        }
    }
}

impl std::fmt::Display for HttpErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Error type for GraphQL client operations.
#[derive(Debug, Clone, Error)]
pub enum GraphqlClientError {
    /// The client could not be set up (bad endpoint, TLS backend, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network, DNS or TLS failure. Never retried.
    #[error("API request failed: {0}")]
    Transport(HttpErrorInfo),

    /// The endpoint answered with a non-success HTTP status.
    #[error("API request failed with HTTP status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated if needed).
        body: String,
    },

    /// Variables could not be serialized.
    #[error("failed encoding API request: {0}")]
    RequestEncode(String),

    /// The response was not valid JSON, or held neither `data` nor `errors`.
    #[error("failed decoding API response: {0}")]
    ResponseDecode(String),

    /// Valid response, but `data` lacks what the caller expected.
    #[error("unexpected API response: {0}")]
    ResponseShape(String),

    /// The API reported an application-level error.
    #[error("{0}")]
    Api(StatusCode),
}

impl From<reqwest::Error> for GraphqlClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::Configuration(err.to_string());
        }
        Self::Transport(HttpErrorInfo::from(err))
    }
}

impl GraphqlClientError {
    /// Status code of an API error.
    #[must_use]
    pub const fn status_code(&self) -> Option<&StatusCode> {
        match self {
            Self::Api(status) => Some(status),
            _ => None,
        }
    }

    /// Returns `true` for failures below the GraphQL layer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus { .. })
    }
}
