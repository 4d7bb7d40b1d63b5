//! Error types for the token exchange.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while exchanging a JWT assertion for an access token.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Token endpoint rejected the assertion.
    #[error("Token endpoint error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Private key could not be parsed as an RSA PEM.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// Assertion could not be signed.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Response body was not a token grant.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
