//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP transport,
//! secure storage) into the shared Rust core. It replaces what a
//! dependency-injection framework would do in a host application: every
//! component is constructed explicitly, in dependency order, with no hidden
//! registry.
//!
//! Desktop apps typically enable the `desktop-shims` feature (which depends
//! on `bridge-desktop`) and call [`TrackerCore::with_desktop_defaults`];
//! mobile hosts inject their own bridge adapters through
//! [`CoreDependencies`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, storage::SecureStore};
use core_auth::{
    AuthHttpClient, AuthInterceptor, AuthState, Authenticator, CredentialStore, SessionManager,
    StaticHeaders, TokenClient,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use provider_trakt::TraktClient;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub secure_store: Arc<dyn SecureStore>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(http_client: Arc<dyn HttpClient>, secure_store: Arc<dyn SecureStore>) -> Self {
        Self {
            http_client,
            secure_store,
        }
    }
}

/// Primary façade exposed to host applications.
///
/// Owns the assembled object graph, from the credential store and token
/// client up through the authenticated HTTP facade and API client, plus the
/// session manager and event bus.
#[derive(Clone)]
pub struct TrackerCore {
    events: EventBus,
    session: Arc<SessionManager>,
    trakt: Arc<TraktClient>,
}

impl TrackerCore {
    /// Assemble the core from a validated configuration and bridge handles.
    pub fn new(config: CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);

        let store = CredentialStore::new(Arc::clone(&deps.secure_store));
        let tokens = Arc::new(TokenClient::new(
            config.api.clone(),
            Arc::clone(&deps.http_client),
        ));
        let authenticator = Arc::new(Authenticator::new(
            store.clone(),
            Arc::clone(&tokens),
            events.clone(),
            config.refresh_timeout,
        ));

        // Interceptor order: fixed API headers first, then authorization
        let http = AuthHttpClient::new(Arc::clone(&deps.http_client), Arc::clone(&authenticator))
            .with_interceptor(Arc::new(StaticHeaders::for_api(&config.api)))
            .with_interceptor(Arc::new(AuthInterceptor::new(store.clone())));

        let trakt = Arc::new(TraktClient::new(http, &config.api));
        let session = Arc::new(SessionManager::new(
            config.api.clone(),
            store,
            tokens,
            authenticator,
            events.clone(),
        ));

        info!("Core assembled");

        Ok(Self {
            events,
            session,
            trakt,
        })
    }

    /// Assemble the core with the default desktop bridges (reqwest HTTP
    /// client and OS keychain storage).
    #[cfg(feature = "desktop-shims")]
    pub fn with_desktop_defaults(config: CoreConfig) -> Result<Self> {
        let http_client: Arc<dyn HttpClient> = Arc::new(
            bridge_desktop::ReqwestHttpClient::with_timeout(config.http_timeout),
        );
        let secure_store: Arc<dyn SecureStore> = Arc::new(
            bridge_desktop::KeyringSecureStore::new(),
        );
        Self::new(config, CoreDependencies::new(http_client, secure_store))
    }

    /// Load persisted credentials and report the restored session state.
    ///
    /// Call once at startup, before issuing API requests.
    pub async fn start(&self) -> Result<AuthState> {
        let state = self.session.restore().await?;
        info!(state = %state, "Session restored");
        Ok(state)
    }

    /// Session lifecycle operations (sign-in, sign-out, state).
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// The tracking API client.
    pub fn trakt(&self) -> &TraktClient {
        &self.trakt
    }

    /// The core event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }
}
