use thiserror::Error;

/// Error taxonomy of the authenticated client.
///
/// Cloneable because a single refresh outcome is delivered to every request
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credentials are stored; the caller must complete sign-in first.
    #[error("not authenticated: no credentials stored")]
    Unauthenticated,

    /// The refresh token was rejected or revoked. Stored credentials have
    /// been erased; only a fresh sign-in recovers from this.
    #[error("refresh token rejected ({reason}); sign-in required")]
    RefreshTerminal { reason: String },

    /// The refresh attempt failed for a retryable reason (network error,
    /// server error, timeout). Stored credentials are unchanged.
    #[error("token refresh failed: {reason}")]
    RefreshTransient { reason: String },

    /// The request was resubmitted with a freshly refreshed token and was
    /// still rejected. Surfaced instead of looping.
    #[error("request failed authentication after a refreshed retry")]
    RetryExhausted,

    /// The authorization code presented at sign-in was rejected.
    #[error("authorization code rejected: {reason}")]
    InvalidAuthCode { reason: String },

    /// Credential storage failed.
    #[error("credential storage failed: {0}")]
    Storage(String),

    /// Stored credential payload could not be decoded; it has been deleted.
    #[error("stored credentials corrupted: {0}")]
    Corrupted(String),

    /// Credentials failed validation (empty token values).
    #[error("invalid credentials: {0}")]
    Invalid(String),

    /// The transport failed before a response was produced.
    #[error("transport error: {0}")]
    Transport(String),
}

impl AuthError {
    /// Whether a later attempt may succeed without user interaction.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::RefreshTransient { .. }
                | AuthError::Storage(_)
                | AuthError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(AuthError::RefreshTransient {
            reason: "timeout".into()
        }
        .is_recoverable());
        assert!(AuthError::Transport("connection reset".into()).is_recoverable());

        assert!(!AuthError::Unauthenticated.is_recoverable());
        assert!(!AuthError::RefreshTerminal {
            reason: "invalid_grant".into()
        }
        .is_recoverable());
        assert!(!AuthError::RetryExhausted.is_recoverable());
    }
}
