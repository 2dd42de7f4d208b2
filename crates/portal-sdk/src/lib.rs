//! Portal SDK - client library for the Portal GraphQL API.
//!
//! This crate provides:
//!
//! - **ApiClient**: GraphQL execution with the session's bearer token
//! - **Auth**: password sign-in, TOTP second factor and token refresh
//! - **Token**: local inspection of issued JWTs (expiry, temporary tokens)
//! - **ServicePermissions**: indexed lookups over a user's permissions
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use portal_sdk::{ApiClient, PortalConfig};
//!
//! let mut api = ApiClient::new(&PortalConfig::new("https://api.example.com/graphql"))?;
//!
//! let authn = api.auth().authenticate("alice", "alice.password", None).await?;
//! if authn.token.is_temporary() {
//!     api.auth()
//!         .complete_totp("alice", authn.token.value(), &read_totp_code())
//!         .await?;
//! }
//!
//! let permissions = api.auth().user_service_permissions(None, Some(&["tdh"][..])).await?;
//! if permissions.has("read-indicators") {
//!     // ...
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod api;
mod auth;
mod config;
mod error;
mod rbac;
mod session;
mod token;

pub use api::ApiClient;
pub use auth::{Auth, Authentication, ServiceAccess};
pub use config::{MAX_API_URL_LEN, PortalConfig, validate_api_url};
pub use error::{PortalError, PortalResult, TokenRejection};
pub use rbac::{Permission, ServicePermissions};
pub use session::{AuthState, Identity, Session, TotpStatus};
pub use token::Token;

pub use portal_graphql::{
    GraphqlClientError, GraphqlRequest, HeaderMap, Record, Scalar, Structured, Transport,
    async_trait,
};
pub use portal_status::StatusCode;

/// Resource label tokens are requested for unless configured otherwise.
pub const DEFAULT_TOKEN_RESOURCE: &str = "PortalRustSDK";
