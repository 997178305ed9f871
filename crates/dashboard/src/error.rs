//! Error types for dashboard fetches.

use thiserror::Error;

/// Errors that end a fetch. Any of them fails the whole poll cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Failed to parse page: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl FetchError {
    /// Credential or session problems. Retrying with the same credentials
    /// will not help.
    pub fn is_authentication(&self) -> bool {
        matches!(self, FetchError::Authentication(_))
    }

    /// Returns true if the next scheduled cycle is likely to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Timeout(_))
    }
}
