use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraktError {
    /// Authentication subsystem error (unauthenticated, refresh failed, ...)
    #[error("authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    /// The API answered with a non-success status
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body did not match the expected shape
    #[error("failed to decode response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, TraktError>;
