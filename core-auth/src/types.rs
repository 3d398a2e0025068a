use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The access/refresh token pair for the tracking API session.
///
/// Both token values are non-empty once authenticated; the absence of a
/// stored pair means "unauthenticated". Owned by the
/// [`CredentialStore`](crate::store::CredentialStore), written only from
/// token-endpoint results, read by the auth interceptor on every request.
///
/// # Security
///
/// Token values must never be logged. The `Debug` implementation redacts
/// them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Short-lived token attached to outgoing requests
    pub access_token: String,
    /// Long-lived token exchanged for a new access token
    pub refresh_token: String,
    /// When the access token expires (UTC), if the token endpoint said
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Create a pair expiring `expires_in` seconds from now.
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: Option<i64>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    /// Reassemble a pair from stored parts.
    pub fn from_parts(
        access_token: String,
        refresh_token: String,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Both token values present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }

    /// Whether the access token is past its advertised expiry at `now`.
    ///
    /// Expiry is advisory: the client refreshes on challenge, not on a timer.
    /// A pair without an expiry never reports expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// [`Credentials::is_expired_at`] against the system clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authentication state of the (single) user session.
///
/// # State Transitions
///
/// ```text
/// SignedOut -> SignedIn <-> TokenRefreshing
///                  |
///                  v
///               Expired -> (sign-in) -> SignedIn
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthState {
    /// No credentials stored
    #[default]
    SignedOut,
    /// Credentials stored and usable
    SignedIn,
    /// A token refresh is in flight
    TokenRefreshing,
    /// The refresh token was rejected; a new sign-in is required
    Expired,
}

impl AuthState {
    /// Whether requests can currently be authenticated (possibly after the
    /// in-flight refresh completes).
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::SignedIn | AuthState::TokenRefreshing)
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::SignedOut => write!(f, "Signed Out"),
            AuthState::SignedIn => write!(f, "Signed In"),
            AuthState::TokenRefreshing => write!(f, "Refreshing Token..."),
            AuthState::Expired => write!(f, "Session Expired"),
        }
    }
}
