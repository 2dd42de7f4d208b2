//! Entry point to the Portal API.

use portal_graphql::{GraphqlClient, GraphqlRequest, ReqwestTransport, Structured, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::Auth;
use crate::session::Session;
use crate::{PortalConfig, PortalResult};

/// Portal API client.
///
/// Owns the GraphQL client and the [`Session`] with the active bearer token.
/// Requests that carry no token of their own are sent with it.
///
/// The client is not internally synchronized: share it across tasks only
/// behind a lock of the caller's choosing.
#[derive(Debug)]
pub struct ApiClient<T = ReqwestTransport> {
    graphql: GraphqlClient<T>,
    session: Session,
    resource: String,
}

impl ApiClient<ReqwestTransport> {
    /// Create a client using the reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Configuration`](crate::PortalError::Configuration)
    /// when the API URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &PortalConfig) -> PortalResult<Self> {
        let endpoint = config.endpoint()?;
        let graphql = GraphqlClient::new(endpoint, &config.transport_config())?;
        Ok(Self::from_parts(graphql, config))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Create a client on top of any transport.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Configuration`](crate::PortalError::Configuration)
    /// when the API URL is invalid.
    pub fn with_transport(config: &PortalConfig, transport: T) -> PortalResult<Self> {
        let endpoint = config.endpoint()?;
        Ok(Self::from_parts(
            GraphqlClient::with_transport(endpoint, transport),
            config,
        ))
    }

    fn from_parts(graphql: GraphqlClient<T>, config: &PortalConfig) -> Self {
        Self {
            graphql,
            session: Session::new(config.token.clone()),
            resource: config.resource.clone(),
        }
    }

    /// The GraphQL endpoint.
    pub fn endpoint(&self) -> &str {
        self.graphql.endpoint()
    }

    /// Default resource label for issued tokens.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The active bearer token.
    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    /// Replace the active bearer token. An empty token clears it.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.session.set_token(token);
    }

    /// Drop the active bearer token.
    pub fn clear_token(&mut self) {
        self.session.clear_token();
    }

    /// Session state.
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The GraphQL client and the session, borrowed apart so a request can be
    /// awaited while the session is held.
    pub(crate) const fn parts_mut(&mut self) -> (&GraphqlClient<T>, &mut Session) {
        (&self.graphql, &mut self.session)
    }

    /// The underlying GraphQL client.
    pub const fn graphql(&self) -> &GraphqlClient<T> {
        &self.graphql
    }

    /// Authentication and permission calls through this client.
    pub const fn auth(&mut self) -> Auth<'_, T> {
        Auth::new(self)
    }

    /// Execute a request and return `data` as a structured record.
    pub async fn execute_graphql<V>(&self, request: GraphqlRequest<V>) -> PortalResult<Structured>
    where
        V: Serialize + Sync,
    {
        let request = self.authorize(request);
        Ok(self.graphql.execute_structured(&request).await?)
    }

    /// Execute a request and return `data` as JSON.
    pub async fn execute_graphql_value<V>(&self, request: GraphqlRequest<V>) -> PortalResult<Value>
    where
        V: Serialize + Sync,
    {
        let request = self.authorize(request);
        Ok(self.graphql.execute_value(&request).await?)
    }

    /// Execute a request and deserialize `data` into `D`.
    pub async fn execute_graphql_data<V, D>(&self, request: GraphqlRequest<V>) -> PortalResult<D>
    where
        V: Serialize + Sync,
        D: DeserializeOwned,
    {
        let request = self.authorize(request);
        Ok(self.graphql.execute_data(&request).await?)
    }

    /// Returns `true` if the API answers the schema probe. Never fails.
    pub async fn is_alive(&self) -> bool {
        let alive = self.graphql.is_reachable().await;
        debug!(endpoint = %self.endpoint(), alive, "checked API liveness");
        alive
    }

    fn authorize<V>(&self, mut request: GraphqlRequest<V>) -> GraphqlRequest<V> {
        if request.token.is_none() {
            request.token = self.session.token().map(str::to_string);
        }
        request
    }
}
