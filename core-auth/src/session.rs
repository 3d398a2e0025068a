//! Session Manager
//!
//! Drives the user-visible authentication lifecycle: building the
//! authorization URL, completing sign-in with the callback code, signing
//! out, and reporting the current session state.

use crate::authenticator::Authenticator;
use crate::error::Result;
use crate::refresher::TokenClient;
use crate::store::CredentialStore;
use crate::types::AuthState;
use core_runtime::config::ApiConfig;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tracing::{info, instrument};
use url::Url;

/// High-level session lifecycle operations.
pub struct SessionManager {
    config: ApiConfig,
    store: CredentialStore,
    tokens: Arc<TokenClient>,
    authenticator: Arc<Authenticator>,
    events: EventBus,
}

impl SessionManager {
    pub fn new(
        config: ApiConfig,
        store: CredentialStore,
        tokens: Arc<TokenClient>,
        authenticator: Arc<Authenticator>,
        events: EventBus,
    ) -> Self {
        Self {
            config,
            store,
            tokens,
            authenticator,
            events,
        }
    }

    /// Load persisted credentials at startup and report the resulting state.
    ///
    /// A corrupted payload has already been deleted by the store when this
    /// returns; the session is then simply signed out.
    pub async fn restore(&self) -> Result<AuthState> {
        match self.store.load().await {
            Ok(Some(_)) => Ok(AuthState::SignedIn),
            Ok(None) => Ok(AuthState::SignedOut),
            Err(e) => {
                // Unreadable credentials degrade to signed-out, storage
                // failures propagate
                if matches!(e, crate::error::AuthError::Corrupted(_)) {
                    Ok(AuthState::SignedOut)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// The URL to open in a browser to start the authorization flow.
    pub fn authorize_url(&self) -> Result<String> {
        let mut url = Url::parse(&format!("{}/oauth/authorize", self.config.base_url))
            .map_err(|e| crate::error::AuthError::Invalid(format!("bad base URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri);

        Ok(url.to_string())
    }

    /// Complete sign-in with the authorization code from the callback.
    ///
    /// Exchanges the code, persists the token pair, and releases the
    /// challenge handler from any terminal state left by an expired session.
    #[instrument(skip(self, code))]
    pub async fn complete_sign_in(&self, code: &str) -> Result<()> {
        info!("Completing sign-in");

        let credentials = self.tokens.exchange_code(code).await?;
        self.store.set(credentials).await?;
        self.authenticator.reset().await;

        let _ = self.events.emit(CoreEvent::Auth(AuthEvent::SignedIn));

        info!("Sign-in completed");
        Ok(())
    }

    /// Sign out, erasing stored credentials.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        info!("Signing out");

        self.store.clear().await?;
        self.authenticator.reset().await;

        let _ = self.events.emit(CoreEvent::Auth(AuthEvent::SignedOut));

        info!("Sign-out completed");
        Ok(())
    }

    /// Current session state.
    pub async fn state(&self) -> AuthState {
        if self.authenticator.is_failed().await {
            return AuthState::Expired;
        }
        if self.authenticator.is_refreshing().await {
            return AuthState::TokenRefreshing;
        }
        match self.store.current() {
            Some(_) => AuthState::SignedIn,
            None => AuthState::SignedOut,
        }
    }

    /// Whether credentials are currently stored.
    pub fn is_signed_in(&self) -> bool {
        self.store.current().is_some()
    }
}
