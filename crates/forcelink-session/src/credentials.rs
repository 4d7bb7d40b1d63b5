//! Username → token index.

use std::collections::HashMap;

/// Maps each username to its one active auth token.
///
/// Only the [`SessionStore`](crate::SessionStore) mutates this index, always
/// together with the session cache, so every token held here resolves to a
/// cached session.
#[derive(Debug, Default)]
pub struct CredentialStore {
    tokens: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active token for a username.
    pub fn get(&self, username: &str) -> Option<&str> {
        self.tokens.get(username).map(String::as_str)
    }

    /// Point a username at a token. Last write wins; the replaced token is returned.
    pub fn set(&mut self, username: impl Into<String>, token: impl Into<String>) -> Option<String> {
        self.tokens.insert(username.into(), token.into())
    }

    /// Drop a username mapping.
    pub fn remove(&mut self, username: &str) -> Option<String> {
        self.tokens.remove(username)
    }

    /// Drop a username mapping only if it still points at `token`.
    pub fn remove_if(&mut self, username: &str, token: &str) -> bool {
        if self.get(username) == Some(token) {
            self.tokens.remove(username);
            true
        } else {
            false
        }
    }

    /// Drop every mapping.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
