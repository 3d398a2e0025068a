//! Auth Challenge Handler
//!
//! Coordinates the token refresh that answers an authentication challenge
//! (a 401 on a request that carried the current access token).
//!
//! The handler is a small state machine (`Idle`, `RefreshInFlight`,
//! `Failed`) guarded by a mutex:
//!
//! - the first challenged request while `Idle` starts the refresh;
//! - every request challenged while `RefreshInFlight` joins the existing
//!   flight instead of starting another one, so N concurrent challenges
//!   produce exactly one token-endpoint call;
//! - a rejected refresh token erases stored credentials and parks the machine
//!   in `Failed` until the next successful sign-in resets it;
//! - transient failures (network, 5xx, timeout) return the machine to `Idle`
//!   so a later request can try again.
//!
//! The refresh itself runs on a detached task: a caller abandoning its
//! request only drops its receiver and never aborts the flight the other
//! waiters depend on. New credentials are persisted before any waiter is
//! released.

use crate::error::{AuthError, Result};
use crate::refresher::TokenClient;
use crate::store::CredentialStore;
use crate::types::Credentials;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Outcome of one refresh flight, shared by every waiter.
type RefreshOutcome = Result<Credentials>;

/// Receiver half of the shared flight; `None` until the flight resolves.
type OutcomeReceiver = watch::Receiver<Option<RefreshOutcome>>;

enum RefreshState {
    /// No refresh outstanding
    Idle,
    /// A refresh is outstanding; joiners wait on this receiver
    InFlight(OutcomeReceiver),
    /// The refresh token was rejected; only a new sign-in leaves this state
    Failed,
}

/// Challenge handler with single-flight refresh coordination.
pub struct Authenticator {
    store: CredentialStore,
    tokens: Arc<TokenClient>,
    events: EventBus,
    state: Arc<Mutex<RefreshState>>,
    refresh_timeout: Duration,
}

impl Authenticator {
    pub fn new(
        store: CredentialStore,
        tokens: Arc<TokenClient>,
        events: EventBus,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            store,
            tokens,
            events,
            state: Arc::new(Mutex::new(RefreshState::Idle)),
            refresh_timeout,
        }
    }

    /// The credential store this handler coordinates.
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Handle an authentication challenge for a request that carried
    /// `failed_token`, returning credentials to resubmit with.
    ///
    /// Joins the in-flight refresh when one exists. When the stored access
    /// token already differs from `failed_token`, another caller finished a
    /// refresh in the meantime and the newer credentials are returned without
    /// touching the network.
    #[instrument(skip(self, failed_token))]
    pub async fn on_auth_challenge(&self, failed_token: &str) -> Result<Credentials> {
        let receiver = {
            let mut state = self.state.lock().await;

            let Some(current) = self.store.current() else {
                return Err(AuthError::Unauthenticated);
            };

            // Another caller already rotated the pair; no refresh needed
            if current.access_token != failed_token {
                debug!("Challenged token already replaced, skipping refresh");
                return Ok(current);
            }

            match &*state {
                RefreshState::Failed => return Err(AuthError::Unauthenticated),
                RefreshState::InFlight(receiver) => {
                    debug!("Joining in-flight token refresh");
                    receiver.clone()
                }
                RefreshState::Idle => {
                    debug!("Starting token refresh");
                    let (sender, receiver) = watch::channel(None);
                    *state = RefreshState::InFlight(receiver.clone());
                    self.spawn_refresh(current, sender);
                    receiver
                }
            }
        };

        Self::await_outcome(receiver).await
    }

    /// Return to `Idle`, forgetting a terminal failure.
    ///
    /// Called after a successful sign-in stores fresh credentials.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        *state = RefreshState::Idle;
    }

    /// Whether the machine is parked after a rejected refresh token.
    pub async fn is_failed(&self) -> bool {
        matches!(&*self.state.lock().await, RefreshState::Failed)
    }

    /// Whether a refresh is currently outstanding.
    pub async fn is_refreshing(&self) -> bool {
        matches!(&*self.state.lock().await, RefreshState::InFlight(_))
    }

    /// Run the refresh on a detached task so that waiter cancellation never
    /// aborts it. Persists before releasing waiters.
    fn spawn_refresh(
        &self,
        current: Credentials,
        sender: watch::Sender<Option<RefreshOutcome>>,
    ) {
        let store = self.store.clone();
        let tokens = Arc::clone(&self.tokens);
        let events = self.events.clone();
        let state = Arc::clone(&self.state);
        let refresh_timeout = self.refresh_timeout;

        tokio::spawn(async move {
            let _ = events.emit(CoreEvent::Auth(AuthEvent::TokenRefreshing));

            let outcome = match timeout(refresh_timeout, tokens.refresh(&current)).await {
                Ok(Ok(fresh)) => match store.set(fresh.clone()).await {
                    Ok(()) => Ok(fresh),
                    Err(e) => {
                        warn!(error = %e, "Refreshed credentials could not be persisted");
                        Err(e)
                    }
                },
                Ok(Err(e)) => Err(e),
                Err(_) => {
                    warn!(
                        timeout_secs = refresh_timeout.as_secs(),
                        "Token refresh timed out"
                    );
                    Err(AuthError::RefreshTransient {
                        reason: "token refresh timed out".to_string(),
                    })
                }
            };

            {
                let mut state = state.lock().await;
                match &outcome {
                    Ok(fresh) => {
                        info!("Token refresh succeeded");
                        let _ = events.emit(CoreEvent::Auth(AuthEvent::TokenRefreshed {
                            expires_at: fresh.expires_at.map(|t| t.timestamp()),
                        }));
                        *state = RefreshState::Idle;
                    }
                    Err(AuthError::RefreshTerminal { reason }) => {
                        warn!(reason = %reason, "Refresh token rejected, erasing credentials");
                        if let Err(e) = store.clear().await {
                            warn!(error = %e, "Failed to erase credentials after rejection");
                        }
                        let _ = events.emit(CoreEvent::Auth(AuthEvent::SessionExpired {
                            reason: reason.clone(),
                        }));
                        *state = RefreshState::Failed;
                    }
                    Err(e) => {
                        let _ = events.emit(CoreEvent::Auth(AuthEvent::AuthError {
                            message: e.to_string(),
                            recoverable: e.is_recoverable(),
                        }));
                        *state = RefreshState::Idle;
                    }
                }
            }

            // Release waiters only after the state transition and persistence
            let _ = sender.send(Some(outcome));
        });
    }

    async fn await_outcome(mut receiver: OutcomeReceiver) -> Result<Credentials> {
        loop {
            {
                let value = receiver.borrow_and_update();
                if let Some(outcome) = value.as_ref() {
                    return outcome.clone();
                }
            }
            if receiver.changed().await.is_err() {
                // The refresh task can only disappear on runtime shutdown
                return Err(AuthError::RefreshTransient {
                    reason: "refresh task dropped".to_string(),
                });
            }
        }
    }
}
