//! Error types for ipguard
//!
//! Providers and stores report failures through [`Error`]. The resolver,
//! checker and recorder never return it; they log it and degrade instead.

use thiserror::Error;

/// Result type alias for ipguard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ipguard
#[derive(Error, Debug)]
pub enum Error {
    /// Account store errors
    #[error("Account store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Account (or other addressed entity) not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error raised by a named lookup provider or store backend
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider or backend name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create an account store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error comes from invalid or unusable configuration
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Whether this error means the addressed record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_the_provider() {
        let err = Error::provider("https://jsonip.com", "HTTP error: 503");
        assert_eq!(
            err.to_string(),
            "Provider error (https://jsonip.com): HTTP error: 503"
        );
    }

    #[test]
    fn not_found_is_detectable() {
        assert!(Error::not_found("account acc-1").is_not_found());
        assert!(!Error::store("connection refused").is_not_found());
    }

    #[test]
    fn json_errors_convert() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
        assert!(!err.is_config());
    }
}
