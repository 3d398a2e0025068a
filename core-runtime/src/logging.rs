//! Logging Bootstrap
//!
//! Initializes the `tracing` subscriber for the core. Hosts call
//! [`init_logging`] once at startup; repeated calls are no-ops so tests can
//! initialize freely.
//!
//! Token and secret values must never reach the log stream. Modules log
//! redacted placeholders, and [`redact_if_sensitive`] is available for
//! formatting values whose field name marks them as sensitive.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line output for development
    Pretty,
    /// Single-line output
    Compact,
    /// Newline-delimited JSON for log shippers
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Compact
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Env-filter directive string, e.g. `"info,core_auth=debug"`.
    /// `RUST_LOG` overrides this when set.
    pub filter: String,
    /// Output format
    pub format: LogFormat,
    /// Include the event's module path in output
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
            display_target: true,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// Subsequent calls return `Ok(())` without replacing the subscriber.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.clone()));

    let result = match config.format {
        LogFormat::Pretty => fmt()
            .with_env_filter(filter)
            .with_target(config.display_target)
            .pretty()
            .try_init(),
        LogFormat::Compact => fmt()
            .with_env_filter(filter)
            .with_target(config.display_target)
            .compact()
            .try_init(),
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .with_target(config.display_target)
            .json()
            .try_init(),
    };

    // A second init (common in tests) is not an error
    let _ = result;
    Ok(())
}

/// Field names whose values are redacted from log output.
const SENSITIVE_FIELDS: &[&str] = &[
    "access_token",
    "refresh_token",
    "client_secret",
    "authorization",
    "password",
    "code",
];

/// Replace a value with a placeholder when its field name marks it sensitive.
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let lowered = field_name.to_ascii_lowercase();
    if SENSITIVE_FIELDS.iter().any(|f| lowered.contains(f)) {
        "[REDACTED]".to_string()
    } else {
        value.to_string()
    }
}
