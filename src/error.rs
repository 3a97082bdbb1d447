//! Error types for Recall.

use thiserror::Error;

/// Library-level error type for Recall operations.
#[derive(Error, Debug)]
pub enum RecallError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Provider error: {0}")]
    Provider(String),

    /// Timeouts, rate limits and 5xx responses. These are safe to retry for
    /// idempotent calls.
    #[error("Provider temporarily unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RecallError {
    /// Whether retrying the failed call might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RecallError::ProviderUnavailable(_) => true,
            RecallError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Result type alias for Recall operations.
pub type Result<T> = std::result::Result<T, RecallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RecallError::ProviderUnavailable("503".to_string()).is_transient());
        assert!(!RecallError::Provider("bad request".to_string()).is_transient());
        assert!(!RecallError::Config("missing key".to_string()).is_transient());
    }
}
