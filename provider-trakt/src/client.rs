//! Tracking API client implementation

use crate::error::{Result, TraktError};
use crate::types::{CalendarEntry, Show, WatchedEntry, WatchlistEntry};
use bridge_traits::http::{HttpRequest, HttpResponse};
use chrono::NaiveDate;
use core_auth::AuthHttpClient;
use core_runtime::config::ApiConfig;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

/// Typed client for the tracking API.
///
/// All requests go through the authenticated facade; an expired access token
/// is refreshed and the request resubmitted without this layer noticing.
pub struct TraktClient {
    http: AuthHttpClient,
    base_url: String,
}

impl TraktClient {
    pub fn new(http: AuthHttpClient, config: &ApiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    /// Episodes airing for shows the user watches, starting at `start` for
    /// `days` days.
    #[instrument(skip(self))]
    pub async fn calendar_shows(&self, start: NaiveDate, days: u32) -> Result<Vec<CalendarEntry>> {
        let path = format!(
            "/calendars/my/shows/{}/{}",
            start.format("%Y-%m-%d"),
            days
        );
        self.get_json(&path).await
    }

    /// Full details for one show, by trakt id or slug.
    #[instrument(skip(self))]
    pub async fn show_summary(&self, id: &str) -> Result<Show> {
        let path = format!("/shows/{}?extended=full", urlencoding::encode(id));
        self.get_json(&path).await
    }

    /// Shows on the user's watchlist.
    #[instrument(skip(self))]
    pub async fn watchlist_shows(&self) -> Result<Vec<WatchlistEntry>> {
        self.get_json("/sync/watchlist/shows").await
    }

    /// The user's watch history, aggregated per show.
    #[instrument(skip(self))]
    pub async fn watched_shows(&self) -> Result<Vec<WatchedEntry>> {
        self.get_json("/sync/watched/shows").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Fetching");

        let response = self.http.execute(HttpRequest::get(url)).await?;
        Self::decode(response)
    }

    fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
        if !response.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "unreadable response body".to_string());
            return Err(TraktError::Api {
                status: response.status,
                message,
            });
        }

        response
            .json()
            .map_err(|e| TraktError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpClient;
    use bridge_traits::storage::SecureStore;
    use bytes::Bytes;
    use core_auth::{AuthInterceptor, Authenticator, CredentialStore, Credentials, TokenClient};
    use core_runtime::events::EventBus;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration;
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

    /// Transport serving canned responses per URL, recording requested URLs.
    struct CannedTransport {
        responses: HashMap<String, (u16, &'static str)>,
        requested: StdMutex<Vec<String>>,
    }

    impl CannedTransport {
        fn new(responses: Vec<(&str, u16, &'static str)>) -> Arc<Self> {
            Arc::new(Self {
                responses: responses
                    .into_iter()
                    .map(|(url, status, body)| (url.to_string(), (status, body)))
                    .collect(),
                requested: StdMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl HttpClient for CannedTransport {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.requested.lock().unwrap().push(request.url.clone());
            let (status, body) = self
                .responses
                .get(&request.url)
                .copied()
                .unwrap_or((404, r#"{"error": "not found"}"#));
            Ok(HttpResponse {
                status,
                headers: Default::default(),
                body: Bytes::from(body),
            })
        }
    }

    fn api_config() -> ApiConfig {
        ApiConfig {
            base_url: "https://api.example.com".to_string(),
            client_id: "client".to_string(),
            client_secret: None,
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            api_version: "2".to_string(),
        }
    }

    async fn trakt_client(transport: Arc<CannedTransport>) -> TraktClient {
        let store = CredentialStore::new(Arc::new(MemorySecureStore::default()));
        store
            .set(Credentials::new("A1".to_string(), "R1".to_string(), Some(3600)))
            .await
            .unwrap();

        let config = api_config();
        let tokens = Arc::new(TokenClient::new(config.clone(), transport.clone()));
        let authenticator = Arc::new(Authenticator::new(
            store.clone(),
            tokens,
            EventBus::new(16),
            Duration::from_secs(5),
        ));
        let http = core_auth::AuthHttpClient::new(transport, authenticator)
            .with_interceptor(Arc::new(AuthInterceptor::new(store)));

        TraktClient::new(http, &config)
    }

    const CALENDAR_BODY: &str = r#"[
        {
            "first_aired": "2026-08-06T01:00:00.000Z",
            "episode": {
                "season": 1,
                "number": 3,
                "title": "Third",
                "ids": { "trakt": 1, "tvdb": null, "imdb": null, "tmdb": null }
            },
            "show": {
                "title": "Example Show",
                "year": 2024,
                "ids": { "trakt": 10, "slug": "example-show", "tvdb": null, "imdb": null, "tmdb": null }
            }
        }
    ]"#;

    #[tokio::test]
    async fn test_calendar_shows_path_and_decoding() {
        let transport = CannedTransport::new(vec![(
            "https://api.example.com/calendars/my/shows/2026-08-06/7",
            200,
            CALENDAR_BODY,
        )]);
        let client = trakt_client(transport.clone()).await;

        let start = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        let entries = client.calendar_shows(start, 7).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].show.title, "Example Show");
        assert_eq!(
            transport.requested.lock().unwrap()[0],
            "https://api.example.com/calendars/my/shows/2026-08-06/7"
        );
    }

    #[tokio::test]
    async fn test_show_summary_encodes_slug() {
        let transport = CannedTransport::new(vec![(
            "https://api.example.com/shows/example-show?extended=full",
            200,
            r#"{
                "title": "Example Show",
                "year": 2024,
                "ids": { "trakt": 10, "slug": "example-show", "tvdb": null, "imdb": null, "tmdb": null },
                "overview": "An example."
            }"#,
        )]);
        let client = trakt_client(transport).await;

        let show = client.show_summary("example-show").await.unwrap();
        assert_eq!(show.title, "Example Show");
        assert_eq!(show.overview.as_deref(), Some("An example."));
    }

    #[tokio::test]
    async fn test_api_error_mapped() {
        let transport = CannedTransport::new(vec![]);
        let client = trakt_client(transport).await;

        let err = client.watchlist_shows().await.unwrap_err();
        match err {
            TraktError::Api { status, .. } => assert_eq!(status, 404),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_decode_error_mapped() {
        let transport = CannedTransport::new(vec![(
            "https://api.example.com/sync/watched/shows",
            200,
            "not json",
        )]);
        let client = trakt_client(transport).await;

        let err = client.watched_shows().await.unwrap_err();
        assert!(matches!(err, TraktError::Decode(_)));
    }
}
