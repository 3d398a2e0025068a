//! Request Interceptors
//!
//! Small pipeline of request transformers applied before dispatch. The
//! facade runs them in registration order; each receives the request built
//! so far and returns the request to send.

use crate::store::CredentialStore;
use bridge_traits::http::HttpRequest;
use core_runtime::config::ApiConfig;

/// A request transformation step in the HTTP call pipeline.
pub trait Interceptor: Send + Sync {
    fn intercept(&self, request: HttpRequest) -> HttpRequest;
}

/// Attaches the current access token as a bearer authorization header.
///
/// Reads the credential store's in-memory copy, never the platform store
/// or the network, so it cannot stall the request path. Requests pass
/// through untouched while unauthenticated.
pub struct AuthInterceptor {
    store: CredentialStore,
}

impl AuthInterceptor {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }
}

impl Interceptor for AuthInterceptor {
    fn intercept(&self, request: HttpRequest) -> HttpRequest {
        match self.store.current() {
            Some(credentials) => request.bearer_token(credentials.access_token),
            None => request,
        }
    }
}

/// Attaches a fixed set of headers to every request.
pub struct StaticHeaders {
    headers: Vec<(String, String)>,
}

impl StaticHeaders {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self { headers }
    }

    /// The tracking API's required headers: content type, API version, and
    /// the client id as API key.
    pub fn for_api(config: &ApiConfig) -> Self {
        Self::new(vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("trakt-api-version".to_string(), config.api_version.clone()),
            ("trakt-api-key".to_string(), config.client_id.clone()),
        ])
    }
}

impl Interceptor for StaticHeaders {
    fn intercept(&self, request: HttpRequest) -> HttpRequest {
        self.headers
            .iter()
            .fold(request, |req, (key, value)| {
                req.header(key.as_str(), value.as_str())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Credentials;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::storage::SecureStore;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemorySecureStore {
        storage: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait::async_trait]
    impl SecureStore for MemorySecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.storage
                .lock()
                .await
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.storage.lock().await.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.storage.lock().await.remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_auth_interceptor_attaches_current_token() {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));
        store
            .set(Credentials::new("A1".to_string(), "R1".to_string(), None))
            .await
            .unwrap();

        let interceptor = AuthInterceptor::new(store);
        let request = interceptor.intercept(HttpRequest::get("https://api.example.com/me"));

        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer A1".to_string())
        );
    }

    #[test]
    fn test_auth_interceptor_passes_through_when_unauthenticated() {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));
        let interceptor = AuthInterceptor::new(store);

        let request = interceptor.intercept(HttpRequest::get("https://api.example.com/me"));
        assert!(!request.headers.contains_key("Authorization"));
    }

    #[test]
    fn test_static_headers() {
        let config = ApiConfig {
            base_url: "https://api.example.com".to_string(),
            client_id: "client-123".to_string(),
            client_secret: None,
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            api_version: "2".to_string(),
        };

        let interceptor = StaticHeaders::for_api(&config);
        let request = interceptor.intercept(HttpRequest::get("https://api.example.com/shows"));

        assert_eq!(
            request.headers.get("trakt-api-version"),
            Some(&"2".to_string())
        );
        assert_eq!(
            request.headers.get("trakt-api-key"),
            Some(&"client-123".to_string())
        );
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
    }
}
