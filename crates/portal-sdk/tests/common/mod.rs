#![allow(dead_code)]

use std::sync::Once;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use portal_sdk::{ApiClient, PortalConfig};
use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wiremock::MockServer;

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,portal_sdk=debug,portal_graphql=debug"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .compact(),
            )
            .init();
    });
}

pub fn api_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&PortalConfig::new(format!("{}/graphql", server.uri()))).expect("client")
}

/// Signed token expiring `lifetime` from now, with the given authorization groups.
pub fn jwt(groups: &[&str], lifetime: TimeDelta) -> String {
    let header = json!({"alg": "HS256", "typ": "JWT"});
    let payload = json!({
        "exp": (Utc::now() + lifetime).timestamp(),
        "authz": {"groups": groups},
    });
    format!(
        "{}.{}.c2lnbmF0dXJl",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// Full token for an account with groups.
pub fn full_token() -> String {
    jwt(&["analysts"], TimeDelta::hours(1))
}

/// Token for a pending two-factor challenge.
pub fn temporary_token() -> String {
    jwt(&[], TimeDelta::minutes(5))
}

/// `auth_createAuthorization` response body.
pub fn authorization_response(token: &str, temporary: bool) -> Value {
    let activated = if temporary {
        json!("2020-07-30T16:12:44.490868Z")
    } else {
        Value::Null
    };
    json!({
        "data": {
            "portalauth": {
                "user": {
                    "id": "3a2e4b6c-0000-4000-8000-000000000001",
                    "username": "alice",
                    "accessTo": []
                },
                "token": token,
                "isTemporaryToken": temporary,
                "otp": {
                    "required": temporary,
                    "activated": activated
                },
                "otpSVGQRCode": null
            }
        }
    })
}
