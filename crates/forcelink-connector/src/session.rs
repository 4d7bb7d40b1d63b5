//! Cached session entries and the events emitted when they leave the cache.

use std::fmt;

use forcelink_session::SessionValue;
use forcelink_types::{Connection, SharedConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque auth token handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    /// Mint a fresh random token.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AuthToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for AuthToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for AuthToken {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl PartialEq<str> for AuthToken {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Result of a successful `authenticate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub auth: AuthToken,
}

/// A logged-in connection cached under its auth token.
///
/// The password is kept only to recognise repeat logins of the same user.
pub struct SessionEntry {
    token: AuthToken,
    username: String,
    password: String,
    connection: SharedConnection,
}

impl SessionEntry {
    pub fn new(
        token: AuthToken,
        username: impl Into<String>,
        password: impl Into<String>,
        connection: SharedConnection,
    ) -> Self {
        Self {
            token,
            username: username.into(),
            password: password.into(),
            connection,
        }
    }

    pub fn auth_token(&self) -> &AuthToken {
        &self.token
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    /// A handle to the entry's connection, lent for one operation.
    pub fn connection(&self) -> SharedConnection {
        self.connection.clone()
    }

    /// Consume the entry for its cleanup.
    pub(crate) fn into_parts(self) -> (AuthToken, String, SharedConnection) {
        (self.token, self.username, self.connection)
    }
}

impl SessionValue for SessionEntry {
    fn token(&self) -> &str {
        self.token.as_str()
    }

    fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for SessionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEntry")
            .field("token", &self.token)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("instance_url", &self.connection.instance_url())
            .finish()
    }
}

/// Notification that a session left the cache and was logged out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session's TTL elapsed.
    Expired { token: AuthToken, username: String },
    /// The session was evicted explicitly (logout or close).
    Removed { token: AuthToken, username: String },
}

impl SessionEvent {
    pub fn token(&self) -> &AuthToken {
        match self {
            SessionEvent::Expired { token, .. } | SessionEvent::Removed { token, .. } => token,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            SessionEvent::Expired { username, .. } | SessionEvent::Removed { username, .. } => {
                username
            }
        }
    }
}
