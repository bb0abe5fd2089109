//! Error types for the DNS-01 hook
//!
//! Every failure is fatal to the invocation: the binary maps any `Error`
//! to a non-zero exit code and stops. Nothing here is retried.

use thiserror::Error;

/// Result type alias for hook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS-01 hook
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing API key, missing certbot env)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain name could not be parsed into (subdomain, zone)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record ledger I/O errors
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// HTTP transport errors (request never produced a usable response)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors (rejected bearer token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider API error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a ledger error
    pub fn ledger(msg: impl Into<String>) -> Self {
        Self::Ledger(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
