//! Error types for session store operations.

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The expiry driver needs a Tokio runtime to run on.
    #[error("session store must be created inside a Tokio runtime")]
    NoRuntime,
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionError>;
