//! Pluggable request transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::error::GraphqlClientError;

/// Sends a request body and returns the raw response body.
///
/// Implementations must report connection, DNS and TLS failures as
/// [`GraphqlClientError::Transport`] and must not retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` to `url` with the given headers.
    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, GraphqlClientError>;
}

/// Transport settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Accept invalid TLS certificates. Only for test deployments.
    pub skip_tls_verify: bool,
    /// User agent header.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            skip_tls_verify: false,
            user_agent: format!("portal-graphql/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP(S) transport backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport from configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, GraphqlClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .danger_accept_invalid_certs(config.skip_tls_verify)
            .build()
            .map_err(|err| GraphqlClientError::Configuration(err.to_string()))?;

        Ok(Self { http })
    }

    /// Wrap an existing reqwest client.
    #[must_use]
    pub const fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, GraphqlClientError> {
        let response = self
            .http
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), len = bytes.len(), "GraphQL response received");

        if !status.is_success() {
            return Err(GraphqlClientError::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&bytes),
            });
        }

        Ok(bytes.to_vec())
    }
}

fn truncate_body(bytes: &[u8]) -> String {
    const MAX_LEN: usize = 4096;
    let mut body = String::from_utf8_lossy(bytes).to_string();
    if body.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push('…');
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_long_body() {
        let body = truncate_body(&[b'a'; 5000]);
        assert_eq!(body.chars().count(), 4097);
        assert!(body.ends_with('…'));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let mut input = vec![b'a'; 4095];
        input.extend_from_slice("é".as_bytes());
        input.extend_from_slice(&[b'b'; 10]);
        let body = truncate_body(&input);
        assert!(body.starts_with(&"a".repeat(4095)));
        assert!(body.ends_with('…'));
    }

    #[test]
    fn short_body_untouched() {
        assert_eq!(truncate_body(b"oops"), "oops");
    }
}
