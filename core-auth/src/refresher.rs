//! Token Endpoint Client
//!
//! Performs the two token-endpoint exchanges the session needs: trading an
//! authorization code for a token pair at sign-in, and trading the refresh
//! token for a fresh pair when the API challenges a request.
//!
//! Every call issues exactly one network attempt. Retry policy belongs to the
//! caller: the challenge handler decides whether a failure is worth another
//! round trip, and it must be able to count refresh attempts exactly.
//!
//! Failure classification:
//! - a 4xx from the token endpoint on refresh means the refresh token is
//!   rejected ([`AuthError::RefreshTerminal`]): the user has to sign in again;
//! - 5xx, network failure, or an undecodable success body is
//!   [`AuthError::RefreshTransient`], retryable later.

use crate::error::{AuthError, Result};
use crate::types::Credentials;
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use bytes::Bytes;
use core_runtime::config::ApiConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Client for the tracking API's OAuth token endpoint.
pub struct TokenClient {
    config: ApiConfig,
    http: Arc<dyn HttpClient>,
}

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    #[allow(dead_code)]
    token_type: Option<String>,
    #[allow(dead_code)]
    scope: Option<String>,
}

/// Error payload the token endpoint returns alongside 4xx statuses.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenClient {
    pub fn new(config: ApiConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    /// Exchange an authorization code for a token pair (sign-in completion).
    #[instrument(skip(self, code))]
    pub async fn exchange_code(&self, code: &str) -> Result<Credentials> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", self.config.client_id.as_str());
        params.insert("redirect_uri", self.config.redirect_uri.as_str());
        if let Some(ref secret) = self.config.client_secret {
            params.insert("client_secret", secret);
        }

        debug!("Exchanging authorization code for tokens");

        let response = self.post_form(&params).await.map_err(|e| {
            AuthError::Transport(format!("token exchange failed: {}", e))
        })?;

        if response.is_success() {
            let parsed: TokenResponse = response.json().map_err(|e| {
                AuthError::Transport(format!("undecodable token response: {}", e))
            })?;

            info!("Authorization code exchanged for tokens");
            return Ok(Self::credentials_from(parsed, None));
        }

        let status = response.status;
        let reason = Self::error_reason(&response.body, status);

        if response.is_client_error() {
            warn!(status, reason = %reason, "Authorization code rejected");
            Err(AuthError::InvalidAuthCode { reason })
        } else {
            warn!(status, reason = %reason, "Token endpoint error during code exchange");
            Err(AuthError::Transport(reason))
        }
    }

    /// Exchange the refresh token of `current` for a fresh pair.
    ///
    /// One attempt, no internal retry. When the endpoint omits a rotated
    /// refresh token the current one is carried forward.
    #[instrument(skip(self, current))]
    pub async fn refresh(&self, current: &Credentials) -> Result<Credentials> {
        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", current.refresh_token.as_str());
        params.insert("client_id", self.config.client_id.as_str());
        params.insert("redirect_uri", self.config.redirect_uri.as_str());
        if let Some(ref secret) = self.config.client_secret {
            params.insert("client_secret", secret);
        }

        debug!("Refreshing access token");

        let response = self.post_form(&params).await.map_err(|e| {
            AuthError::RefreshTransient {
                reason: e.to_string(),
            }
        })?;

        if response.is_success() {
            let parsed: TokenResponse =
                response
                    .json()
                    .map_err(|e| AuthError::RefreshTransient {
                        reason: format!("undecodable token response: {}", e),
                    })?;

            info!("Access token refreshed");
            return Ok(Self::credentials_from(
                parsed,
                Some(current.refresh_token.clone()),
            ));
        }

        let status = response.status;
        let reason = Self::error_reason(&response.body, status);

        if response.is_client_error() {
            // The endpoint rejected the refresh token itself
            warn!(status, reason = %reason, "Refresh token rejected");
            Err(AuthError::RefreshTerminal { reason })
        } else {
            warn!(status, reason = %reason, "Token endpoint error during refresh");
            Err(AuthError::RefreshTransient { reason })
        }
    }

    async fn post_form(
        &self,
        params: &HashMap<&str, &str>,
    ) -> bridge_traits::error::Result<bridge_traits::http::HttpResponse> {
        let body = serde_urlencoded::to_string(params).map_err(|e| {
            bridge_traits::BridgeError::OperationFailed(format!(
                "failed to encode token request: {}",
                e
            ))
        })?;

        let request = HttpRequest::post(self.config.token_url())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Bytes::from(body));

        // Exactly one attempt; the caller owns retry policy
        self.http
            .execute_with_retry(request, RetryPolicy::none())
            .await
    }

    fn credentials_from(parsed: TokenResponse, fallback_refresh: Option<String>) -> Credentials {
        let refresh_token = parsed
            .refresh_token
            .or(fallback_refresh)
            .unwrap_or_default();
        Credentials::new(parsed.access_token, refresh_token, parsed.expires_in)
    }

    fn error_reason(body: &Bytes, status: u16) -> String {
        match serde_json::from_slice::<TokenErrorResponse>(body) {
            Ok(parsed) => match (parsed.error, parsed.error_description) {
                (Some(code), Some(desc)) => format!("{}: {}", code, desc),
                (Some(code), None) => code,
                _ => format!("HTTP {}", status),
            },
            Err(_) => format!("HTTP {}", status),
        }
    }
}
