//! GraphQL client over a pluggable transport.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use portal_status::StatusCode;

use crate::error::GraphqlClientError;
use crate::operation::GraphqlRequest;
use crate::structured::{ROOT_RECORD_NAME, Structured, to_structured};
use crate::transport::{ReqwestTransport, Transport, TransportConfig};

/// Introspection query used by [`GraphqlClient::is_reachable`].
pub const SCHEMA_PROBE_QUERY: &str = "{__schema { queryType { name }}}";

const SCHEMA_PROBE_MARKER: &str = "Query";

/// GraphQL client.
///
/// Every call is a single request through the transport: no caching,
/// batching or retries. The client itself holds no credentials; the bearer
/// token travels with each [`GraphqlRequest`].
#[derive(Debug, Clone)]
pub struct GraphqlClient<T = ReqwestTransport> {
    endpoint: String,
    transport: T,
}

impl GraphqlClient<ReqwestTransport> {
    /// Create a client using the reqwest transport.
    pub fn new(
        endpoint: impl Into<String>,
        config: &TransportConfig,
    ) -> Result<Self, GraphqlClientError> {
        Ok(Self::with_transport(endpoint, ReqwestTransport::new(config)?))
    }
}

impl<T: Transport> GraphqlClient<T> {
    /// Create a client on top of any transport.
    #[must_use]
    pub fn with_transport(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    /// The GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Send the request and return the response body as received.
    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    pub async fn execute_raw<V>(
        &self,
        request: &GraphqlRequest<V>,
    ) -> Result<Vec<u8>, GraphqlClientError>
    where
        V: Serialize + Sync,
    {
        let body = request.to_body()?;
        let headers = request_headers(request.token.as_deref())?;
        debug!(len = body.len(), authorized = request.token.is_some(), "sending GraphQL request");
        self.transport.post(&self.endpoint, headers, body).await
    }

    /// Send the request and return the `data` member.
    ///
    /// Fails with [`GraphqlClientError::Api`] when the response reports
    /// errors; only the first reported error is used.
    pub async fn execute_value<V>(
        &self,
        request: &GraphqlRequest<V>,
    ) -> Result<Value, GraphqlClientError>
    where
        V: Serialize + Sync,
    {
        let bytes = self.execute_raw(request).await?;
        classify_response(&bytes)
    }

    /// Send the request and return `data` as a structured record.
    pub async fn execute_structured<V>(
        &self,
        request: &GraphqlRequest<V>,
    ) -> Result<Structured, GraphqlClientError>
    where
        V: Serialize + Sync,
    {
        let data = self.execute_value(request).await?;
        Ok(to_structured(data, ROOT_RECORD_NAME))
    }

    /// Send the request and deserialize `data` into `D`.
    pub async fn execute_data<V, D>(
        &self,
        request: &GraphqlRequest<V>,
    ) -> Result<D, GraphqlClientError>
    where
        V: Serialize + Sync,
        D: DeserializeOwned,
    {
        let data = self.execute_value(request).await?;
        serde_json::from_value(data)
            .map_err(|err| GraphqlClientError::ResponseShape(err.to_string()))
    }

    /// Returns `true` if the endpoint answers the schema probe.
    ///
    /// Every failure, transport or otherwise, yields `false`.
    pub async fn is_reachable(&self) -> bool {
        let request = GraphqlRequest::new(SCHEMA_PROBE_QUERY);
        match self.execute_value(&request).await {
            Ok(data) => {
                data.pointer("/__schema/queryType/name")
                    .and_then(Value::as_str)
                    == Some(SCHEMA_PROBE_MARKER)
            }
            Err(err) => {
                debug!(error = %err, "GraphQL endpoint not reachable");
                false
            }
        }
    }
}

fn request_headers(token: Option<&str>) -> Result<HeaderMap, GraphqlClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GraphqlClientError::Configuration("token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// Split a raw response into data or an API error.
///
/// A non-empty `errors` array wins over `data`. Without errors, `data` must
/// be a JSON object.
pub fn classify_response(bytes: &[u8]) -> Result<Value, GraphqlClientError> {
    let response: Value = serde_json::from_slice(bytes)
        .map_err(|err| GraphqlClientError::ResponseDecode(err.to_string()))?;

    let Value::Object(mut response) = response else {
        return Err(GraphqlClientError::ResponseDecode(
            "response is not a JSON object".to_string(),
        ));
    };

    if let Some(first) = response
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let status = status_from_error(first)?;
        debug!(code = status.code(), message = status.message(), "GraphQL API error");
        return Err(GraphqlClientError::Api(status));
    }

    match response.remove("data") {
        Some(data @ Value::Object(_)) => Ok(data),
        _ => Err(GraphqlClientError::ResponseDecode(
            "response holds neither data nor errors".to_string(),
        )),
    }
}

fn status_from_error(error: &Value) -> Result<StatusCode, GraphqlClientError> {
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            GraphqlClientError::ResponseDecode("API response contained unusable error definition".to_string())
        })?;

    let extensions = match error.get("extensions") {
        None | Some(Value::Null) => return Ok(StatusCode::new(message)),
        Some(Value::Object(extensions)) => extensions,
        Some(_) => {
            return Err(GraphqlClientError::ResponseDecode(
                "API response contained unusable error extensions".to_string(),
            ));
        }
    };

    let message = match extensions.get("detail").and_then(Value::as_str) {
        Some(detail) => format!("{message} ({detail})"),
        None => message.to_string(),
    };

    Ok(status_with_code(message, extensions))
}

fn status_with_code(message: String, extensions: &Map<String, Value>) -> StatusCode {
    match extensions.get("code") {
        Some(Value::String(code)) => StatusCode::from_code_str(message, code),
        Some(Value::Number(code)) => {
            let code = code
                .as_u64()
                .and_then(|code| u32::try_from(code).ok())
                .unwrap_or(0);
            StatusCode::from_code(message, code)
        }
        _ => StatusCode::new(message),
    }
}
