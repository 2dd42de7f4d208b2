//! Authentication state held by an [`ApiClient`](crate::ApiClient).

use std::fmt;

use chrono::{DateTime, Utc};

use crate::auth::Authentication;

/// Where a session stands in the sign-in flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No authentication has succeeded yet.
    #[default]
    Unauthenticated,
    /// Primary credentials were sent; no answer yet.
    PrimaryPending,
    /// Primary credentials were accepted, a TOTP code is needed next.
    TotpRequired,
    /// A full (non-temporary) token was issued.
    Authenticated,
}

/// Who the session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User ID.
    pub id: String,
    /// Username.
    pub username: String,
}

/// Two-factor state reported with the last authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TotpStatus {
    /// Whether a TOTP code is required for this user.
    pub required: bool,
    /// When TOTP was activated for this user.
    pub activated: Option<DateTime<Utc>>,
    /// SVG QR code for enrolling an authenticator, when offered.
    pub qr_code: Option<String>,
}

/// Which exchange produced an [`Authentication`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exchange {
    Primary,
    Totp,
    Refresh,
}

/// The active bearer token and what is known about its owner.
///
/// There is one active token. Every successful authentication supersedes the
/// previous identity and two-factor state instead of merging with it.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<String>,
    identity: Option<Identity>,
    totp: TotpStatus,
    state: AuthState,
}

impl Session {
    /// A session starting from a configured token, if any.
    ///
    /// A configured token does not change the state: nothing is known about
    /// its owner until an authentication call succeeds.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            ..Self::default()
        }
    }

    /// The active bearer token.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Identity of the last successful authentication.
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Two-factor state of the last successful authentication.
    pub const fn totp(&self) -> &TotpStatus {
        &self.totp
    }

    /// Current state.
    pub const fn state(&self) -> AuthState {
        self.state
    }

    pub(crate) fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
    }

    pub(crate) fn clear_token(&mut self) {
        self.token = None;
    }

    /// Apply a successful exchange.
    pub(crate) fn record(&mut self, authn: &Authentication, exchange: Exchange, activate: bool) {
        let temporary = authn.token.is_temporary();

        self.identity = (!authn.id.is_empty() || !authn.username.is_empty()).then(|| Identity {
            id: authn.id.clone(),
            username: authn.username.clone(),
        });
        self.totp = TotpStatus {
            required: authn.totp_required,
            activated: authn.totp_activated,
            qr_code: authn.totp_qr_code.clone(),
        };

        let install = match exchange {
            Exchange::Primary if temporary => {
                self.state = AuthState::TotpRequired;
                false
            }
            Exchange::Primary | Exchange::Totp | Exchange::Refresh => {
                self.state = AuthState::Authenticated;
                true
            }
        };

        if install && activate {
            self.set_token(authn.token.value());
        }
    }
}

/// State change of one in-flight exchange.
///
/// A primary exchange enters `PrimaryPending` on creation. Unless
/// [`PendingExchange::commit`] runs, dropping the guard puts back the state held
/// before, so a failed or cancelled call leaves the session as it was.
pub(crate) struct PendingExchange<'s> {
    session: &'s mut Session,
    exchange: Exchange,
    previous: AuthState,
    committed: bool,
}

impl<'s> PendingExchange<'s> {
    pub(crate) const fn begin(session: &'s mut Session, exchange: Exchange) -> Self {
        let previous = session.state;
        if matches!(exchange, Exchange::Primary) {
            session.state = AuthState::PrimaryPending;
        }
        Self {
            session,
            exchange,
            previous,
            committed: false,
        }
    }

    /// Apply the successful exchange and return the resulting state.
    pub(crate) fn commit(mut self, authn: &Authentication, activate: bool) -> AuthState {
        self.session.record(authn, self.exchange, activate);
        self.committed = true;
        self.session.state
    }
}

impl Drop for PendingExchange<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.session.state = self.previous;
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("identity", &self.identity)
            .field("totp", &self.totp)
            .field("state", &self.state)
            .finish()
    }
}
