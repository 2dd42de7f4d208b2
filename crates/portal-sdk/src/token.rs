//! Bearer tokens issued by the authorization mutation.
//!
//! A token with three non-empty dot-separated segments is treated as a signed
//! token (JWT). Its header and payload are decoded locally to learn the expiry
//! and whether the token only serves a pending two-factor challenge. The
//! signature is never verified here; that is the server's business.

use std::fmt;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, TimeDelta, Utc};
use portal_graphql::temporal::{diff_utc_now, utc_now};
use serde_json::Value;

use crate::{PortalError, PortalResult, TokenRejection};

/// URL-safe alphabet, accepting segments with or without padding.
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A bearer credential and what could be learned from it.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    is_temporary: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Parse a raw credential.
    ///
    /// `is_temporary_hint` is what the server reported alongside the token. It
    /// is used as-is for opaque tokens; for signed tokens the payload's
    /// authorization groups decide.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::MalformedToken`] when a signed token cannot be
    /// decoded, is not a JWT, lacks a usable expiry, or has already expired.
    pub fn parse(raw: impl Into<String>, is_temporary_hint: bool) -> PortalResult<Self> {
        Self::parse_at(raw, is_temporary_hint, utc_now())
    }

    /// Parse a raw credential, judging expiry against `now`.
    ///
    /// # Errors
    ///
    /// See [`Token::parse`].
    pub fn parse_at(
        raw: impl Into<String>,
        is_temporary_hint: bool,
        now: DateTime<Utc>,
    ) -> PortalResult<Self> {
        let value = raw.into();

        let Some((header, payload)) = signed_segments(&value) else {
            return Ok(Self {
                value,
                is_temporary: is_temporary_hint,
                expires_at: None,
            });
        };

        let reject = PortalError::MalformedToken;

        let header = decode_segment(header).ok_or(reject(TokenRejection::Decode))?;
        let payload = decode_segment(payload).ok_or(reject(TokenRejection::Decode))?;

        if header.get("typ").and_then(Value::as_str) != Some("JWT") {
            return Err(reject(TokenRejection::NotJwt));
        }

        let expires_at = payload
            .get("exp")
            .and_then(expiry_from_claim)
            .ok_or(reject(TokenRejection::BadExpire))?;

        if expires_at <= now {
            return Err(reject(TokenRejection::Expired));
        }

        let has_groups = payload
            .pointer("/authz/groups")
            .and_then(Value::as_array)
            .is_some_and(|groups| !groups.is_empty());

        Ok(Self {
            value,
            is_temporary: !has_groups,
            expires_at: Some(expires_at),
        })
    }

    /// The raw credential, as sent in the `Authorization` header.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether the token only allows completing a two-factor challenge.
    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        self.is_temporary
    }

    /// Expiry of a signed token. Opaque tokens have none.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// True once the expiry has been reached. Opaque tokens never expire locally.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= utc_now())
    }

    /// Time left before expiry, zero when no expiry is known.
    #[must_use]
    pub fn time_until_expiry(&self) -> TimeDelta {
        self.expires_at.map_or(TimeDelta::zero(), diff_utc_now)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[redacted]")
            .field("is_temporary", &self.is_temporary)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Header and payload segments, when `value` is shaped like a signed token.
fn signed_segments(value: &str) -> Option<(&str, &str)> {
    let mut parts = value.split('.');
    let (header, payload, signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || [header, payload, signature].iter().any(|p| p.is_empty()) {
        return None;
    }
    Some((header, payload))
}

fn decode_segment(segment: &str) -> Option<Value> {
    let bytes = SEGMENT_ENGINE.decode(segment).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        value @ Value::Object(_) => Some(value),
        _ => None,
    }
}

/// Seconds since the epoch, integral or fractional.
fn expiry_from_claim(claim: &Value) -> Option<DateTime<Utc>> {
    if let Some(secs) = claim.as_i64() {
        return DateTime::from_timestamp(secs, 0);
    }
    let secs = claim.as_f64()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    #[allow(clippy::cast_possible_truncation)]
    let whole = whole as i64;
    DateTime::from_timestamp(whole, nanos)
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    use super::*;

    fn signed(header: &Value, payload: &Value) -> String {
        format!(
            "{}.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(payload.to_string())
        )
    }

    fn jwt_header() -> Value {
        json!({"alg": "HS256", "typ": "JWT"})
    }

    fn rejection(result: PortalResult<Token>) -> TokenRejection {
        match result {
            Err(PortalError::MalformedToken(reason)) => reason,
            other => panic!("expected malformed token, got {other:?}"),
        }
    }

    #[test]
    fn opaque_token_uses_hint() {
        let token = Token::parse("0123456789abcdef", true).unwrap();
        assert_eq!(token.value(), "0123456789abcdef");
        assert!(token.is_temporary());
        assert!(token.expires_at().is_none());
        assert!(!token.is_expired());
        assert_eq!(token.time_until_expiry(), TimeDelta::zero());
    }

    #[test]
    fn empty_or_short_segment_lists_are_opaque() {
        for raw in ["a.b", "a..c", "a.b.c.d", ".b.c", ""] {
            let token = Token::parse(raw, false).unwrap();
            assert!(token.expires_at().is_none(), "{raw}");
        }
    }

    #[test]
    fn signed_token_with_groups_is_permanent() {
        let now = utc_now();
        let exp = now.timestamp() + 3600;
        let raw = signed(
            &jwt_header(),
            &json!({"exp": exp, "authz": {"groups": ["analysts"]}}),
        );

        let token = Token::parse_at(raw.clone(), true, now).unwrap();
        assert_eq!(token.value(), raw);
        assert!(!token.is_temporary());
        assert_eq!(token.expires_at().map(|t| t.timestamp()), Some(exp));
        assert!(!token.is_expired());
        assert!(token.time_until_expiry() > TimeDelta::minutes(50));
    }

    #[test]
    fn empty_or_absent_groups_mean_temporary() {
        let now = utc_now();
        let exp = now.timestamp() + 60;

        let empty = signed(&jwt_header(), &json!({"exp": exp, "authz": {"groups": []}}));
        assert!(Token::parse_at(empty, false, now).unwrap().is_temporary());

        let absent = signed(&jwt_header(), &json!({"exp": exp}));
        assert!(Token::parse_at(absent, false, now).unwrap().is_temporary());
    }

    #[test]
    fn padded_segments_are_accepted() {
        let now = utc_now();
        let header = base64::engine::general_purpose::URL_SAFE.encode(jwt_header().to_string());
        let payload = base64::engine::general_purpose::URL_SAFE
            .encode(json!({"exp": now.timestamp() + 60}).to_string());
        let raw = format!("{header}.{payload}.sig");
        assert!(Token::parse_at(raw, false, now).is_ok());
    }

    #[test]
    fn fractional_expiry_is_accepted() {
        let now = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        let raw = signed(&jwt_header(), &json!({"exp": 1_600_000_100.5}));
        let token = Token::parse_at(raw, false, now).unwrap();
        assert_eq!(
            token.expires_at(),
            DateTime::from_timestamp(1_600_000_100, 500_000_000)
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        let past = signed(&jwt_header(), &json!({"exp": 1_599_999_999}));
        assert_eq!(rejection(Token::parse_at(past, false, now)), TokenRejection::Expired);

        let exactly_now = signed(&jwt_header(), &json!({"exp": 1_600_000_000}));
        assert_eq!(
            rejection(Token::parse_at(exactly_now, false, now)),
            TokenRejection::Expired
        );
    }

    #[test]
    fn issued_expired_fixture_is_rejected() {
        let raw = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                   eyJleHAiOjE1OTU5NDI4MDAsImF1dGh6Ijp7Imdyb3VwcyI6W119fQ.\
                   c2lnbmF0dXJl";
        assert_eq!(rejection(Token::parse(raw, false)), TokenRejection::Expired);
    }

    #[test]
    fn undecodable_segments_are_rejected() {
        assert_eq!(
            rejection(Token::parse("!!!.eyJ9.sig", false)),
            TokenRejection::Decode
        );

        let not_object = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode("[1]"),
            URL_SAFE_NO_PAD.encode("{}")
        );
        assert_eq!(rejection(Token::parse(not_object, false)), TokenRejection::Decode);
    }

    #[test]
    fn header_must_declare_jwt() {
        let raw = signed(&json!({"typ": "JWS"}), &json!({"exp": 4_102_444_800_i64}));
        assert_eq!(rejection(Token::parse(raw, false)), TokenRejection::NotJwt);

        let untyped = signed(&json!({"alg": "none"}), &json!({"exp": 4_102_444_800_i64}));
        assert_eq!(rejection(Token::parse(untyped, false)), TokenRejection::NotJwt);
    }

    #[test]
    fn expiry_must_be_numeric() {
        for payload in [json!({}), json!({"exp": "tomorrow"}), json!({"exp": null})] {
            let raw = signed(&jwt_header(), &payload);
            assert_eq!(rejection(Token::parse(raw, false)), TokenRejection::BadExpire);
        }
    }

    #[test]
    fn debug_redacts_value() {
        let token = Token::parse("super-secret", false).unwrap();
        let debug = format!("{token:?}");
        assert!(debug.contains("redacted"));
        assert!(!debug.contains("super-secret"));
    }
}
