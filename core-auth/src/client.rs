//! HTTP Client Facade
//!
//! Single request-execution entry point for the API layer. A request runs
//! through the interceptor pipeline, is dispatched over the transport, and a
//! 401 response is routed through the [`Authenticator`] before the final
//! result is returned.
//!
//! A challenged request is resubmitted exactly once, with the token the
//! refresh produced. A second 401 surfaces as
//! [`AuthError::RetryExhausted`]; the refresh cycle is never re-entered for
//! the same request.

use crate::authenticator::Authenticator;
use crate::error::{AuthError, Result};
use crate::interceptor::Interceptor;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// HTTP status the tracking API uses for authentication challenges.
const STATUS_UNAUTHORIZED: u16 = 401;

/// Authenticated request facade.
///
/// Cloning is cheap; clones share the transport, pipeline, and challenge
/// handler.
#[derive(Clone)]
pub struct AuthHttpClient {
    transport: Arc<dyn HttpClient>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    authenticator: Arc<Authenticator>,
}

impl AuthHttpClient {
    pub fn new(transport: Arc<dyn HttpClient>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            transport,
            interceptors: Vec::new(),
            authenticator,
        }
    }

    /// Append an interceptor; they run in registration order.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Execute a request with authentication handled transparently.
    ///
    /// Returns the response for any status except 401. A 401 on a request
    /// that carried a token triggers the shared refresh and one resubmission.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request_id = Uuid::new_v4();
        let prepared = self.prepare(request.clone());
        let sent_token = bearer_of(&prepared);

        debug!(%request_id, url = %prepared.url, "Dispatching request");

        let response = self
            .transport
            .execute(prepared)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if response.status != STATUS_UNAUTHORIZED {
            return Ok(response);
        }

        debug!(%request_id, "Request challenged, coordinating token refresh");

        // A 401 without a token means there was nothing to refresh
        let Some(token) = sent_token else {
            return Err(AuthError::Unauthenticated);
        };

        let fresh = self.authenticator.on_auth_challenge(&token).await?;

        // Resubmit exactly once, pinned to the refreshed token
        let mut retry = self.prepare(request);
        retry.headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", fresh.access_token),
        );

        let response = self
            .transport
            .execute(retry)
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if response.status == STATUS_UNAUTHORIZED {
            warn!(%request_id, "Request rejected again after refresh");
            return Err(AuthError::RetryExhausted);
        }

        debug!(%request_id, status = response.status, "Resubmission succeeded");
        Ok(response)
    }

    fn prepare(&self, request: HttpRequest) -> HttpRequest {
        self.interceptors
            .iter()
            .fold(request, |req, interceptor| interceptor.intercept(req))
    }
}

/// Extract the bearer token a prepared request carries, if any.
fn bearer_of(request: &HttpRequest) -> Option<String> {
    request
        .headers
        .get("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}
