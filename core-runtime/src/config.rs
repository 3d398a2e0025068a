//! Core Configuration
//!
//! Build-time configuration for the show tracker core: tracking API
//! endpoints, OAuth client credentials, and operational timeouts.
//!
//! Configuration is assembled with a builder and validated once, at
//! construction. Client credentials can be supplied explicitly or picked up
//! from the environment (`SHOWTRACK_CLIENT_ID` / `SHOWTRACK_CLIENT_SECRET`),
//! which keeps secrets out of checked-in host code.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Environment variable consulted when no client id is set explicitly.
pub const ENV_CLIENT_ID: &str = "SHOWTRACK_CLIENT_ID";
/// Environment variable consulted when no client secret is set explicitly.
pub const ENV_CLIENT_SECRET: &str = "SHOWTRACK_CLIENT_SECRET";

/// Default tracking API base URL.
const DEFAULT_BASE_URL: &str = "https://api.trakt.tv";

/// Redirect URI for installed applications without a callback server.
const DEFAULT_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Tracking API version sent with every request.
const DEFAULT_API_VERSION: &str = "2";

/// Tracking API endpoint and OAuth client configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// API base URL (no trailing slash)
    pub base_url: String,
    /// OAuth client ID, also sent as the API key header
    pub client_id: String,
    /// OAuth client secret (confidential clients only)
    pub client_secret: Option<String>,
    /// Redirect URI registered for the OAuth client
    pub redirect_uri: String,
    /// API version header value
    pub api_version: String,
}

impl ApiConfig {
    /// Token-exchange endpoint derived from the base URL.
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url)
    }
}

// Client secret must never appear in logs
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Top-level core configuration.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Tracking API configuration
    pub api: ApiConfig,
    /// Timeout applied to ordinary API requests
    pub http_timeout: Duration,
    /// Upper bound on a single token-refresh attempt; elapsing is treated as
    /// a transient refresh failure
    pub refresh_timeout: Duration,
    /// Event bus buffer size
    pub event_buffer_size: usize,
}

impl CoreConfig {
    /// Start building a configuration.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// Called by [`CoreConfigBuilder::build`]; exposed for hosts that
    /// construct the struct directly.
    pub fn validate(&self) -> Result<()> {
        if self.api.client_id.trim().is_empty() {
            return Err(Error::Config(format!(
                "client_id is required (set it on the builder or via {})",
                ENV_CLIENT_ID
            )));
        }

        let parsed = Url::parse(&self.api.base_url)
            .map_err(|e| Error::Config(format!("invalid base_url: {}", e)))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(Error::Config(format!(
                "base_url must be http(s), got {}",
                parsed.scheme()
            )));
        }
        if self.api.base_url.ends_with('/') {
            return Err(Error::Config(
                "base_url must not have a trailing slash".to_string(),
            ));
        }

        if self.http_timeout.is_zero() || self.refresh_timeout.is_zero() {
            return Err(Error::Config("timeouts must be non-zero".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    base_url: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: Option<String>,
    http_timeout: Option<Duration>,
    refresh_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Override the tracking API base URL (no trailing slash).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// OAuth client ID; falls back to `SHOWTRACK_CLIENT_ID`.
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// OAuth client secret; falls back to `SHOWTRACK_CLIENT_SECRET`.
    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Redirect URI registered for the OAuth client.
    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Timeout for ordinary API requests (default 30s).
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Upper bound on one token-refresh attempt (default 30s).
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Event bus buffer size (default 100).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Finalize and validate the configuration.
    pub fn build(self) -> Result<CoreConfig> {
        let client_id = self
            .client_id
            .or_else(|| std::env::var(ENV_CLIENT_ID).ok())
            .unwrap_or_default();
        let client_secret = self
            .client_secret
            .or_else(|| std::env::var(ENV_CLIENT_SECRET).ok());

        let config = CoreConfig {
            api: ApiConfig {
                base_url: self
                    .base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                client_id,
                client_secret,
                redirect_uri: self
                    .redirect_uri
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
                api_version: DEFAULT_API_VERSION.to_string(),
            },
            http_timeout: self.http_timeout.unwrap_or(Duration::from_secs(30)),
            refresh_timeout: self.refresh_timeout.unwrap_or(Duration::from_secs(30)),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder().client_id("test-client")
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.api_version, "2");
        assert_eq!(config.api.token_url(), "https://api.trakt.tv/oauth/token");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_client_id_rejected() {
        // Only meaningful when the env override is unset
        if std::env::var(ENV_CLIENT_ID).is_ok() {
            return;
        }
        let result = CoreConfig::builder().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = builder().base_url("not a url").build();
        assert!(result.is_err());

        let result = builder().base_url("ftp://api.example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_trailing_slash_rejected() {
        let result = builder().base_url("https://api.trakt.tv/").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = builder().refresh_timeout(Duration::ZERO).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_client_secret() {
        let config = builder().client_secret("super-secret").build().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
