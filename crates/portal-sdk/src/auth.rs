//! Authentication against the Portal API.
//!
//! Sign-in is one or two calls of the same `auth_createAuthorization`
//! mutation:
//!
//! 1. [`Auth::authenticate`] sends username and password. Users with two-factor
//!    authentication get a temporary token back.
//! 2. [`Auth::complete_totp`] sends that temporary token with a TOTP code and
//!    gets the full token.
//!
//! Full tokens are short-lived and renewed with [`Auth::refresh`].

use chrono::{DateTime, Utc};
use portal_graphql::temporal::decode_utc_iso8601;
use portal_graphql::{GraphqlClient, GraphqlRequest, ReqwestTransport, Transport};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::rbac::ServicePermissions;
use crate::session::{Exchange, PendingExchange};
use crate::{PortalError, PortalResult, Token};

const AUTHORIZATION_MUTATION: &str = "mutation ($portalauth: auth_AuthorizationInput!) {
  portalauth: auth_createAuthorization(input: $portalauth) {
    user {
      id
      username
      accessTo {
        service { id code }
        group { code }
      }
    }
    token
    isTemporaryToken
    otp {
      required
      activated
    }
    otpSVGQRCode
  }
}";

const USER_SERVICE_PERMISSIONS_QUERY: &str = "query ($id: ID, $services: [String!]) {
  user: auth_user(id: $id) {
    accessControl {
      servicePermissions(filter: {serviceCode: $services}) {
        service { code }
        permissions { id slug }
      }
    }
  }
}";

/// Service and group a user has access to (legacy, superseded by permissions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccess {
    /// Service ID.
    pub service_id: String,
    /// Service code.
    pub service_code: String,
    /// Group code within the service.
    pub group_code: Option<String>,
}

/// Result of a successful authorization exchange.
#[derive(Debug, Clone)]
pub struct Authentication {
    /// User ID; empty when the response carried no user.
    pub id: String,
    /// Username; empty when the response carried no user.
    pub username: String,
    /// The issued token.
    pub token: Token,
    /// Temporary flag as reported by the server.
    pub token_is_temporary: bool,
    /// Whether the user must pass a TOTP challenge.
    pub totp_required: bool,
    /// When TOTP was activated for the user.
    pub totp_activated: Option<DateTime<Utc>>,
    /// SVG QR code for enrolling an authenticator.
    pub totp_qr_code: Option<String>,
    /// Legacy service access list.
    pub access_to: Vec<ServiceAccess>,
}

impl Authentication {
    fn from_payload(payload: AuthorizationPayload) -> PortalResult<Self> {
        let token = Token::parse(payload.token, payload.is_temporary_token)?;

        let totp_activated = payload
            .otp
            .activated
            .as_deref()
            .map(decode_utc_iso8601)
            .transpose()
            .map_err(|err| PortalError::ResponseShape(format!("otp.activated: {err}")))?;

        let (id, username, access_to) = match payload.user {
            Some(user) => {
                let access_to = user
                    .access_to
                    .unwrap_or_default()
                    .into_iter()
                    .map(|entry| ServiceAccess {
                        service_id: entry.service.id,
                        service_code: entry.service.code,
                        group_code: entry.group.map(|group| group.code),
                    })
                    .collect();
                (user.id, user.username, access_to)
            }
            None => (String::new(), String::new(), Vec::new()),
        };

        Ok(Self {
            id,
            username,
            token,
            token_is_temporary: payload.is_temporary_token,
            totp_required: payload.otp.required,
            totp_activated,
            totp_qr_code: payload.otp_svg_qr_code,
            access_to,
        })
    }
}

#[derive(Serialize)]
struct AuthorizationVariables<'a> {
    portalauth: AuthorizationInput<'a>,
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationInput<'a> {
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temporary_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    otp_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<&'a str>,
}

#[derive(Deserialize)]
struct AuthorizationData {
    portalauth: Option<AuthorizationPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationPayload {
    user: Option<UserPayload>,
    token: String,
    is_temporary_token: bool,
    otp: OtpPayload,
    #[serde(rename = "otpSVGQRCode", default)]
    otp_svg_qr_code: Option<String>,
}

#[derive(Deserialize)]
struct OtpPayload {
    required: bool,
    activated: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPayload {
    id: String,
    username: String,
    #[serde(default)]
    access_to: Option<Vec<AccessPayload>>,
}

#[derive(Deserialize)]
struct AccessPayload {
    service: ServicePayload,
    group: Option<GroupPayload>,
}

#[derive(Deserialize)]
struct ServicePayload {
    id: String,
    code: String,
}

#[derive(Deserialize)]
struct GroupPayload {
    code: String,
}

#[derive(Serialize)]
struct UserPermissionsVariables<'a> {
    id: Option<&'a str>,
    services: Option<&'a [&'a str]>,
}

/// Authentication, token handling and permission lookups for one client.
///
/// Borrows the [`ApiClient`] mutably: a successful exchange installs the new
/// token on it unless [`Auth::without_token_activation`] was used.
#[derive(Debug)]
pub struct Auth<'a, T = ReqwestTransport> {
    api: &'a mut ApiClient<T>,
    activate_token: bool,
}

impl<'a, T: Transport> Auth<'a, T> {
    pub(crate) const fn new(api: &'a mut ApiClient<T>) -> Self {
        Self {
            api,
            activate_token: true,
        }
    }

    /// Return issued tokens without installing them on the client.
    #[must_use]
    pub const fn without_token_activation(mut self) -> Self {
        self.activate_token = false;
        self
    }

    /// The client's active token.
    pub fn token(&self) -> Option<&str> {
        self.api.token()
    }

    /// Replace the client's active token.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.api.set_token(token);
    }

    /// Authenticate with username and password for `resource` (the
    /// client's configured resource when `None`).
    ///
    /// A temporary token in the result means a TOTP code must follow through
    /// [`Auth::complete_totp`]; temporary tokens are never installed.
    #[instrument(skip(self, password), fields(endpoint = %self.api.endpoint()))]
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
        resource: Option<&str>,
    ) -> PortalResult<Authentication> {
        let resource = resource.unwrap_or_else(|| self.api.resource()).to_string();
        let input = AuthorizationInput {
            username,
            password: Some(password),
            resource: Some(&resource),
            ..AuthorizationInput::default()
        };

        self.run(input, Exchange::Primary).await
    }

    /// Complete two-factor authentication with the temporary token returned
    /// by [`Auth::authenticate`] and the current TOTP code.
    #[instrument(skip(self, temporary_token, totp_code), fields(endpoint = %self.api.endpoint()))]
    pub async fn complete_totp(
        &mut self,
        username: &str,
        temporary_token: &str,
        totp_code: &str,
    ) -> PortalResult<Authentication> {
        let input = AuthorizationInput {
            username,
            temporary_token: Some(temporary_token),
            otp_code: Some(totp_code),
            ..AuthorizationInput::default()
        };

        self.run(input, Exchange::Totp).await
    }

    /// Exchange a still-valid token for a new one. The server invalidates
    /// `previous_token`.
    #[instrument(skip(self, previous_token), fields(endpoint = %self.api.endpoint()))]
    pub async fn refresh(
        &mut self,
        username: &str,
        previous_token: &str,
        resource: Option<&str>,
    ) -> PortalResult<Authentication> {
        let resource = resource.unwrap_or_else(|| self.api.resource()).to_string();
        let input = AuthorizationInput {
            username,
            refresh_token: Some(previous_token),
            resource: Some(&resource),
            ..AuthorizationInput::default()
        };

        self.run(input, Exchange::Refresh).await
    }

    /// Permissions of `user_id` (the token's owner when `None`), optionally
    /// limited to the given service codes.
    #[instrument(skip(self), fields(endpoint = %self.api.endpoint()))]
    pub async fn user_service_permissions(
        &self,
        user_id: Option<&str>,
        services: Option<&[&str]>,
    ) -> PortalResult<ServicePermissions> {
        let request = GraphqlRequest::new(USER_SERVICE_PERMISSIONS_QUERY).with_variables(
            UserPermissionsVariables {
                id: user_id,
                services,
            },
        );

        let data = self.api.execute_graphql_value(request).await?;
        let user = data
            .get("user")
            .filter(|user| !user.is_null())
            .ok_or_else(|| PortalError::ResponseShape("missing user".to_string()))?;

        let permissions = ServicePermissions::build(user)?;
        debug!(count = permissions.len(), "loaded service permissions");
        Ok(permissions)
    }

    async fn run(
        &mut self,
        input: AuthorizationInput<'_>,
        exchange: Exchange,
    ) -> PortalResult<Authentication> {
        let activate = self.activate_token;
        let (graphql, session) = self.api.parts_mut();
        let pending = PendingExchange::begin(session, exchange);

        match exchange_authorization(graphql, input).await {
            Ok(authn) => {
                let state = pending.commit(&authn, activate);
                debug!(
                    ?exchange,
                    temporary = authn.token.is_temporary(),
                    ?state,
                    "authorization succeeded"
                );
                Ok(authn)
            }
            Err(err) => {
                drop(pending);
                debug!(?exchange, error = %err, "authorization failed");
                Err(err)
            }
        }
    }
}

async fn exchange_authorization<T: Transport>(
    graphql: &GraphqlClient<T>,
    input: AuthorizationInput<'_>,
) -> PortalResult<Authentication> {
    let request = GraphqlRequest::new(AUTHORIZATION_MUTATION)
        .with_variables(AuthorizationVariables { portalauth: input });

    let data: AuthorizationData = graphql.execute_data(&request).await?;
    let payload = data
        .portalauth
        .ok_or_else(|| PortalError::ResponseShape("missing portalauth".to_string()))?;

    Authentication::from_payload(payload)
}
