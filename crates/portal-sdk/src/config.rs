//! Client configuration.

use std::fmt;
use std::time::Duration;

use portal_graphql::TransportConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{DEFAULT_TOKEN_RESOURCE, PortalError, PortalResult};

/// Longest API URL accepted by [`validate_api_url`].
pub const MAX_API_URL_LEN: usize = 300;

const fn default_timeout_secs() -> u64 {
    30
}

fn default_resource() -> String {
    DEFAULT_TOKEN_RESOURCE.to_string()
}

fn default_user_agent() -> String {
    format!("portal-sdk/{}", env!("CARGO_PKG_VERSION"))
}

/// Settings for an [`ApiClient`](crate::ApiClient).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// GraphQL endpoint, for example `https://api.example.com/graphql`.
    pub api_url: String,

    /// Bearer token to start with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Resource label tokens are issued for.
    #[serde(default = "default_resource")]
    pub resource: String,

    /// Accept any server certificate.
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,

    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl PortalConfig {
    /// Configuration for `api_url` with every other setting at its default.
    #[must_use]
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
            resource: default_resource(),
            skip_tls_verify: false,
            timeout: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }

    /// Set the initial bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the resource label.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Disable TLS certificate verification.
    #[must_use]
    pub const fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.as_secs();
        self
    }

    /// Validated endpoint, trimmed.
    pub fn endpoint(&self) -> PortalResult<String> {
        validate_api_url(&self.api_url)
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.timeout),
            skip_tls_verify: self.skip_tls_verify,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("resource", &self.resource)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Check that `api_url` can serve as a GraphQL endpoint and return it trimmed.
///
/// # Errors
///
/// Returns [`PortalError::Configuration`] for empty or overlong input, query or
/// fragment parts, schemes other than `http`/`https`, or a missing host.
pub fn validate_api_url(api_url: &str) -> PortalResult<String> {
    let trimmed = api_url.trim();
    let invalid = |reason: &str| PortalError::Configuration(format!("invalid API URL: {reason}"));

    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    if trimmed.len() > MAX_API_URL_LEN {
        return Err(invalid("too long"));
    }

    let url = Url::parse(trimmed).map_err(|err| invalid(&err.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }

    Ok(trimmed.to_string())
}
