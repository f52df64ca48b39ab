//! Error handling for the identity provider.
//!
//! ## NIST 800-53 Rev5: SI-11 (Error Handling)
//!
//! Error messages are designed to be informative for debugging while not
//! exposing sensitive information to end users.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for process-level operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage error surfaced from a repository adapter.
    #[error("storage error: {0}")]
    Storage(String),

    /// Cryptographic error.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Internal error.
    #[error("internal error")]
    Internal,
}

impl Error {
    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Crypto(_) | Self::Internal)
    }

    /// Returns whether this error represents a caller mistake.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_is_generic() {
        let error = Error::Internal;
        // Don't expose internal details
        assert_eq!(error.to_string(), "internal error");
    }

    #[test]
    fn classifies_server_and_client_errors() {
        assert!(Error::Storage("connection reset".to_string()).is_server_error());
        assert!(!Error::Storage("connection reset".to_string()).is_client_error());
        assert!(Error::Validation("bad issuer".to_string()).is_client_error());
        assert!(!Error::Config("missing".to_string()).is_server_error());
    }
}
