//! SDK error types.

use portal_graphql::GraphqlClientError;
use portal_status::StatusCode;

/// Why a signed token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Header or payload is not base64-encoded JSON.
    Decode,
    /// Header does not declare type `JWT`.
    NotJwt,
    /// Expiry claim missing or not a usable timestamp.
    BadExpire,
    /// Expiry claim is not in the future.
    Expired,
}

impl std::fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode => write!(f, "decode"),
            Self::NotJwt => write!(f, "not JWT"),
            Self::BadExpire => write!(f, "bad expire"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Portal SDK errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PortalError {
    /// Invalid endpoint or client settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network, DNS, TLS or HTTP-level failure.
    #[error("API request failed: {0}")]
    Transport(String),

    /// Response is not JSON, or holds neither data nor errors.
    #[error("failed decoding API response: {0}")]
    ResponseDecode(String),

    /// Response is valid but lacks fields the operation needs.
    #[error("unexpected API response: {0}")]
    ResponseShape(String),

    /// The API reported an error.
    #[error("{0}")]
    Api(StatusCode),

    /// An issued signed token failed validation.
    #[error("malformed user token ({0})")]
    MalformedToken(TokenRejection),
}

impl PortalError {
    /// Status code of an API error, for programmatic branching.
    #[must_use]
    pub const fn status_code(&self) -> Option<&StatusCode> {
        match self {
            Self::Api(status) => Some(status),
            _ => None,
        }
    }
}

impl From<GraphqlClientError> for PortalError {
    fn from(err: GraphqlClientError) -> Self {
        match err {
            GraphqlClientError::Configuration(message)
            | GraphqlClientError::RequestEncode(message) => Self::Configuration(message),
            GraphqlClientError::Transport(info) => Self::Transport(info.message),
            GraphqlClientError::HttpStatus { status, body } => {
                Self::Transport(format!("HTTP status {status}: {body}"))
            }
            GraphqlClientError::ResponseDecode(message) => Self::ResponseDecode(message),
            GraphqlClientError::ResponseShape(message) => Self::ResponseShape(message),
            GraphqlClientError::Api(status) => Self::Api(status),
        }
    }
}

/// Result type for SDK operations.
pub type PortalResult<T> = Result<T, PortalError>;
