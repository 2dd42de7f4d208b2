//! GraphQL request construction.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::GraphqlClientError;

/// GraphQL query wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GraphqlQuery {
    query: String,
}

impl GraphqlQuery {
    /// Create a new query from a string.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Create a new query from a static string.
    #[must_use]
    pub fn from_static(query: &'static str) -> Self {
        Self::new(query)
    }

    /// Return the query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.query
    }
}

/// A query or mutation ready to be sent.
///
/// Variables can be any serializable value; they are left out of the wire
/// body when they serialize to `null` or to an empty object. Timestamps
/// (`chrono::DateTime<Utc>`) serialize to RFC 3339 with a `Z` suffix.
#[derive(Debug, Clone)]
pub struct GraphqlRequest<V = Value> {
    /// Query text.
    pub query: GraphqlQuery,
    /// Variables.
    pub variables: Option<V>,
    /// Fragment definitions appended to the query.
    pub fragments: Vec<String>,
    /// Bearer token sent in the `Authorization` header.
    pub token: Option<String>,
}

impl GraphqlRequest<Value> {
    /// Create a request without variables.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: GraphqlQuery::new(query),
            variables: None,
            fragments: Vec::new(),
            token: None,
        }
    }
}

impl<V: Serialize> GraphqlRequest<V> {
    /// Replace the variables.
    #[must_use]
    pub fn with_variables<W: Serialize>(self, variables: W) -> GraphqlRequest<W> {
        GraphqlRequest {
            query: self.query,
            variables: Some(variables),
            fragments: self.fragments,
            token: self.token,
        }
    }

    /// Append a fragment definition.
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragments.push(fragment.into());
        self
    }

    /// Append several fragment definitions.
    #[must_use]
    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments.extend(fragments.into_iter().map(Into::into));
        self
    }

    /// Authorize the request with a bearer token. Empty tokens are ignored.
    #[must_use]
    pub fn with_token(mut self, token: Option<impl Into<String>>) -> Self {
        self.token = token.map(Into::into).filter(|t: &String| !t.is_empty());
        self
    }

    /// Query text with all fragments, newline-joined.
    #[must_use]
    pub fn document(&self) -> String {
        let mut document = self.query.as_str().to_string();
        for fragment in &self.fragments {
            document.push('\n');
            document.push_str(fragment);
        }
        document
    }

    /// Wire body: `{"query": ..., "variables"?: {...}}` as UTF-8 JSON.
    pub fn to_body(&self) -> Result<Vec<u8>, GraphqlClientError> {
        let mut body = Map::new();
        body.insert("query".to_string(), Value::String(self.document()));

        if let Some(variables) = &self.variables {
            let value = serde_json::to_value(variables)
                .map_err(|err| GraphqlClientError::RequestEncode(err.to_string()))?;
            match value {
                Value::Null => {}
                Value::Object(map) if map.is_empty() => {}
                value @ Value::Object(_) => {
                    body.insert("variables".to_string(), value);
                }
                _ => {
                    return Err(GraphqlClientError::RequestEncode(
                        "variables must serialize to a JSON object".to_string(),
                    ));
                }
            }
        }

        serde_json::to_vec(&Value::Object(body))
            .map_err(|err| GraphqlClientError::RequestEncode(err.to_string()))
    }
}
