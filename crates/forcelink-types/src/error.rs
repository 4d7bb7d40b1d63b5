//! Errors raised by connection implementations.

/// Result type for connection operations.
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Error type for operations against the remote CRM service.
///
/// These are passed through the session layer untouched, so the message is
/// whatever the remote side (or the transport) reported.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with an error payload.
    #[error("{code}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code reported by the service (e.g. `INVALID_FIELD`).
        code: String,
        /// Human readable message.
        message: String,
    },

    /// Login was rejected.
    #[error("{0}")]
    Auth(String),

    /// The request could not be built from the supplied arguments.
    #[error("{0}")]
    InvalidRequest(String),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConnectionError {
    /// Check if the service rejected the session (expired or revoked).
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ConnectionError::Auth(_))
            || matches!(self, ConnectionError::Api { status: 401, .. })
    }

    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConnectionError::Api { status: 404, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ConnectionError::Api {
            status: 400,
            code: "INVALID_FIELD".to_string(),
            message: "No such column 'Foo'".to_string(),
        };
        assert_eq!(err.to_string(), "INVALID_FIELD: No such column 'Foo'");
        assert!(!err.is_auth_error());
    }

    #[test]
    fn test_auth_classification() {
        assert!(ConnectionError::Auth("INVALID_LOGIN".to_string()).is_auth_error());
        let expired = ConnectionError::Api {
            status: 401,
            code: "INVALID_SESSION_ID".to_string(),
            message: "Session expired or invalid".to_string(),
        };
        assert!(expired.is_auth_error());
        assert!(!expired.is_not_found());
    }
}
