//! Credential Persistence
//!
//! Stores the session's token pair durably through the platform
//! [`SecureStore`] and keeps an in-memory copy so the auth interceptor can
//! read the current access token without suspending.
//!
//! Mutations are serialized: a reader never observes a half-written pair, and
//! the cached copy only changes after the durable write succeeded. Storage
//! failures surface to the caller; an absent pair after a clean read simply
//! means "unauthenticated".

use crate::error::{AuthError, Result};
use crate::types::Credentials;
use bridge_traits::storage::SecureStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Key under which the token pair lives in the secure store.
const CREDENTIALS_KEY: &str = "trakt_credentials";

/// Serializable wrapper for the stored token pair.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredentials {
    access_token: String,
    refresh_token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Durable credential storage with a synchronously readable copy.
///
/// Cloning is cheap; all clones share the same cache and backing store.
#[derive(Clone)]
pub struct CredentialStore {
    secure_store: Arc<dyn SecureStore>,
    cached: Arc<RwLock<Option<Credentials>>>,
    // Serializes load/set/clear so durable state and cache move together
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl CredentialStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        debug!("Initializing CredentialStore");
        Self {
            secure_store,
            cached: Arc::new(RwLock::new(None)),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Load persisted credentials into the cache.
    ///
    /// Called once at startup. Returns the loaded pair, `None` when nothing
    /// is stored. A payload that fails to decode is deleted and reported as
    /// [`AuthError::Corrupted`]; the session is then simply unauthenticated.
    pub async fn load(&self) -> Result<Option<Credentials>> {
        let _guard = self.write_lock.lock().await;

        let data = self
            .secure_store
            .get_secret(CREDENTIALS_KEY)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let Some(data) = data else {
            debug!("No credentials found in storage");
            self.swap_cache(None);
            return Ok(None);
        };

        let stored: StoredCredentials = match serde_json::from_slice(&data) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Stored credentials corrupted, deleting");
                if let Err(delete_err) = self.secure_store.delete_secret(CREDENTIALS_KEY).await {
                    warn!(error = %delete_err, "Failed to delete corrupted credentials");
                }
                self.swap_cache(None);
                return Err(AuthError::Corrupted(e.to_string()));
            }
        };

        let credentials = Credentials::from_parts(
            stored.access_token,
            stored.refresh_token,
            stored.expires_at,
        );

        info!(
            expires_at = ?credentials.expires_at,
            "Credentials loaded from storage"
        );

        self.swap_cache(Some(credentials.clone()));
        Ok(Some(credentials))
    }

    /// Current credentials, read from the in-memory copy.
    ///
    /// Never touches the platform store, so it is safe on the request path.
    pub fn current(&self) -> Option<Credentials> {
        self.cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Persist a new token pair, then publish it to readers.
    ///
    /// Rejects pairs with empty token values; the invariant is that stored
    /// credentials are always usable.
    pub async fn set(&self, credentials: Credentials) -> Result<()> {
        if !credentials.is_complete() {
            return Err(AuthError::Invalid(
                "access and refresh tokens must be non-empty".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;

        let stored = StoredCredentials {
            access_token: credentials.access_token.clone(),
            refresh_token: credentials.refresh_token.clone(),
            expires_at: credentials.expires_at,
        };

        let json = serde_json::to_vec(&stored)
            .map_err(|e| AuthError::Storage(format!("serialization failed: {}", e)))?;

        self.secure_store
            .set_secret(CREDENTIALS_KEY, &json)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to persist credentials");
                AuthError::Storage(e.to_string())
            })?;

        self.swap_cache(Some(credentials));

        info!("Credentials stored");
        Ok(())
    }

    /// Erase stored credentials.
    ///
    /// Idempotent. The cache is cleared even if the durable delete fails, so
    /// no request keeps using a token the caller decided to revoke.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        self.swap_cache(None);

        self.secure_store
            .delete_secret(CREDENTIALS_KEY)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to delete credentials from storage");
                AuthError::Storage(e.to_string())
            })?;

        info!("Credentials cleared");
        Ok(())
    }

    fn swap_cache(&self, value: Option<Credentials>) {
        let mut cached = self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cached = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory SecureStore for testing
    #[derive(Clone, Default)]
    struct MemorySecureStore {
        storage: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_writes: bool,
    }

    #[async_trait::async_trait]
    impl SecureStore for MemorySecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            if self.fail_writes {
                return Err(BridgeError::OperationFailed("store offline".to_string()));
            }
            let mut storage = self.storage.lock().await;
            storage.insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            let storage = self.storage.lock().await;
            Ok(storage.get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            let mut storage = self.storage.lock().await;
            storage.remove(key);
            Ok(())
        }
    }

    fn credentials(access: &str, refresh: &str) -> Credentials {
        Credentials::new(access.to_string(), refresh.to_string(), Some(3600))
    }

    #[tokio::test]
    async fn test_set_and_current() {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));

        assert!(store.current().is_none());

        store.set(credentials("A1", "R1")).await.unwrap();

        let current = store.current().unwrap();
        assert_eq!(current.access_token, "A1");
        assert_eq!(current.refresh_token, "R1");
    }

    #[tokio::test]
    async fn test_load_round_trip() {
        let secure_store = Arc::new(MemorySecureStore::default());

        let store = CredentialStore::new(secure_store.clone());
        store.set(credentials("A1", "R1")).await.unwrap();

        // A fresh store instance over the same backing storage sees the pair
        let restored = CredentialStore::new(secure_store);
        assert!(restored.current().is_none());

        let loaded = restored.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "A1");
        assert_eq!(restored.current().unwrap().refresh_token, "R1");
    }

    #[tokio::test]
    async fn test_load_absent_is_unauthenticated_not_error() {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));
        let loaded = store.load().await.unwrap();
        assert!(loaded.is_none());
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));
        store.set(credentials("A1", "R1")).await.unwrap();

        store.clear().await.unwrap();
        assert!(store.current().is_none());
        assert!(store.load().await.unwrap().is_none());

        // Clearing again is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_rejects_empty_tokens() {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));

        let result = store
            .set(Credentials::new(String::new(), "R1".to_string(), None))
            .await;
        assert!(matches!(result, Err(AuthError::Invalid(_))));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_and_keeps_cache() {
        let secure_store = Arc::new(MemorySecureStore {
            fail_writes: true,
            ..Default::default()
        });
        let store = CredentialStore::new(secure_store);

        let result = store.set(credentials("A1", "R1")).await;
        assert!(matches!(result, Err(AuthError::Storage(_))));

        // The cache must not advertise a pair that was never persisted
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_corrupted_payload_deleted_and_reported() {
        let secure_store = Arc::new(MemorySecureStore::default());
        secure_store
            .set_secret(CREDENTIALS_KEY, b"not json")
            .await
            .unwrap();

        let store = CredentialStore::new(secure_store.clone());
        let result = store.load().await;
        assert!(matches!(result, Err(AuthError::Corrupted(_))));

        // Corrupted payload is gone; the next load is a clean "absent"
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_whole_pair() {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));

        store.set(credentials("A1", "R1")).await.unwrap();
        store.set(credentials("A2", "R2")).await.unwrap();

        let current = store.current().unwrap();
        assert_eq!(current.access_token, "A2");
        assert_eq!(current.refresh_token, "R2");
    }
}
