//! Connector error types.

use forcelink_oauth::OAuthError;
use forcelink_session::SessionError;
use forcelink_types::ConnectionError;
use thiserror::Error;

/// Errors surfaced by connector operations.
///
/// Messages are plain sentences meant to be shown to the caller as-is.
/// Failures of the remote service and of the token exchange pass through
/// unchanged.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("'username' property is missing or invalid.")]
    InvalidUsername,

    #[error("'password' property is missing or invalid.")]
    InvalidPassword,

    #[error("'oauth2.clientSecret' property is invalid.")]
    InvalidClientSecret,

    /// The username has a live session under a different password.
    #[error("invalid username or password.")]
    InvalidCredentials,

    /// Unknown, expired or disallowed auth token.
    #[error("Invalid 'auth' token.")]
    InvalidAuthToken,

    /// The acting-user claim is missing from the caller's claims.
    #[error("Claim type \"{0}\" was not found in user claims.")]
    ClaimNotFound(String),

    #[error("credentials.privateKey is required when using OAuth JWT Bearer Flow.")]
    MissingPrivateKey,

    #[error("credentials.clientId is required when using OAuth JWT Bearer Flow.")]
    MissingClientId,

    #[error("credentials.username is required when using OAuth JWT Bearer Flow.")]
    MissingActAsUsername,

    /// Neither a login host nor an instance url from the token endpoint.
    #[error("credentials.loginHost is required when using OAuth JWT Bearer Flow.")]
    MissingLoginHost,

    /// A required operation argument is missing.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    TokenExchange(#[from] OAuthError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ConnectorError {
    /// Check if the error was raised before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConnectorError::InvalidUsername
                | ConnectorError::InvalidPassword
                | ConnectorError::InvalidClientSecret
                | ConnectorError::ClaimNotFound(_)
                | ConnectorError::MissingPrivateKey
                | ConnectorError::MissingClientId
                | ConnectorError::MissingActAsUsername
                | ConnectorError::Validation(_)
        )
    }
}

/// Result type for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;
