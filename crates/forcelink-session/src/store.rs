//! The owning store: both indices behind one lock, plus the expiry timer.

use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, trace, warn};

use crate::cache::{CacheStats, SessionCache};
use crate::config::StoreConfig;
use crate::credentials::CredentialStore;
use crate::error::{Result, SessionError};

/// A value that can live in the [`SessionStore`].
pub trait SessionValue: Send + 'static {
    /// Auth token the entry is keyed by.
    fn token(&self) -> &str;

    /// Username the entry was authenticated as.
    fn username(&self) -> &str;
}

/// Receives entries evicted by the expiry timer.
///
/// The receiver owns the evicted entries and is expected to release whatever
/// they hold (e.g. log out their connections).
pub type ExpiredReceiver<V> = mpsc::UnboundedReceiver<V>;

/// Outcome of a username lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum UserLookup<R> {
    /// No token is mapped to the username.
    Unknown,
    /// The username maps to `token`; `session` is the projection of its entry,
    /// or `None` if the entry has already expired.
    Known { token: String, session: Option<R> },
}

struct Indices<V> {
    sessions: SessionCache<V>,
    credentials: CredentialStore,
}

impl<V: SessionValue> Indices<V> {
    /// Remove a session and the username mapping that points at it.
    fn evict(&mut self, token: &str) -> Option<V> {
        let entry = self.sessions.remove(token)?;
        self.credentials.remove_if(entry.username(), token);
        Some(entry)
    }

    fn evict_expired(&mut self, now: Instant) -> Vec<V> {
        self.sessions
            .drain_expired(now)
            .into_iter()
            .map(|(token, entry)| {
                self.credentials.remove_if(entry.username(), &token);
                entry
            })
            .collect()
    }
}

struct Shared<V> {
    indices: Mutex<Indices<V>>,
    rearm: Arc<Notify>,
    expired_tx: mpsc::UnboundedSender<V>,
}

impl<V: SessionValue> Shared<V> {
    /// Hand evicted entries to the receiver. Must be called without the lock held.
    fn post_expired(&self, expired: Vec<V>) {
        for entry in expired {
            trace!(token = %entry.token(), username = %entry.username(), "Session expired");
            if self.expired_tx.send(entry).is_err() {
                warn!("Expired session receiver dropped; entry discarded");
            }
        }
    }
}

impl<V> Drop for Shared<V> {
    fn drop(&mut self) {
        // Wake the driver so it notices the store is gone and exits.
        self.rearm.notify_one();
    }
}

/// Session entries indexed by token and by username.
///
/// Both indices are mutated together under one lock, so removing a session
/// always removes its username mapping as well. A background task evicts
/// sessions when their TTL elapses and posts them to the [`ExpiredReceiver`]
/// returned by [`spawn`](SessionStore::spawn); the task never performs any
/// cleanup I/O itself.
///
/// Cloning the store is cheap and shares the same indices. The expiry task
/// stops once every clone has been dropped.
pub struct SessionStore<V> {
    shared: Arc<Shared<V>>,
    config: StoreConfig,
}

impl<V: SessionValue> SessionStore<V> {
    /// Create a store and start its expiry task on the current Tokio runtime.
    pub fn spawn(config: StoreConfig) -> Result<(Self, ExpiredReceiver<V>)> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let rearm = Arc::new(Notify::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            indices: Mutex::new(Indices {
                sessions: SessionCache::new(config.ttl),
                credentials: CredentialStore::new(),
            }),
            rearm: Arc::clone(&rearm),
            expired_tx: tx,
        });

        runtime.spawn(drive_expiry(Arc::downgrade(&shared), rearm));
        debug!(ttl_ms = config.ttl.as_millis() as u64, "Session store started");

        Ok((Self { shared, config }, rx))
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Insert a session and map its username to it.
    ///
    /// Returns the token the username previously mapped to, if any. That
    /// session stays cached under its own token until it expires.
    pub fn insert(&self, entry: V) -> Option<String> {
        let token = entry.token().to_string();
        let username = entry.username().to_string();

        let replaced = {
            let mut indices = self.shared.indices.lock();
            indices.sessions.insert(token.clone(), entry);
            indices.credentials.set(username.clone(), token.clone())
        };
        self.shared.rearm.notify_one();

        if let Some(ref previous) = replaced {
            warn!(
                username = %username,
                previous = %previous,
                token = %token,
                "Username remapped; previous session left to expire"
            );
        }
        replaced
    }

    /// Project a live session through `f`.
    pub fn get_with<R>(&self, token: &str, f: impl FnOnce(&V) -> R) -> Option<R> {
        let indices = self.shared.indices.lock();
        indices.sessions.get(token).map(f)
    }

    /// Check if a live session exists for the token.
    pub fn contains(&self, token: &str) -> bool {
        self.shared.indices.lock().sessions.contains(token)
    }

    /// Active token for a username.
    pub fn token_for(&self, username: &str) -> Option<String> {
        let indices = self.shared.indices.lock();
        indices.credentials.get(username).map(str::to_string)
    }

    /// Look up a username and project its session through `f`, in one step.
    ///
    /// Sessions past their deadline are evicted first, even if the timer has
    /// not fired yet, so an expired session never shadows its username.
    pub fn lookup_user<R>(&self, username: &str, f: impl FnOnce(&V) -> R) -> UserLookup<R> {
        let (lookup, expired) = {
            let mut indices = self.shared.indices.lock();
            let expired = indices.evict_expired(Instant::now());
            let lookup = match indices.credentials.get(username) {
                None => UserLookup::Unknown,
                Some(token) => UserLookup::Known {
                    token: token.to_string(),
                    session: indices.sessions.get(token).map(f),
                },
            };
            (lookup, expired)
        };
        if !expired.is_empty() {
            debug!(count = expired.len(), "Sessions expired ahead of timer");
        }
        self.shared.post_expired(expired);
        lookup
    }

    /// Remove a session (and its username mapping). The caller owns the
    /// returned entry and is responsible for its cleanup.
    pub fn remove(&self, token: &str) -> Option<V> {
        let entry = self.shared.indices.lock().evict(token);
        if entry.is_some() {
            trace!(token = %token, "Session removed from store");
        }
        entry
    }

    /// Drop every username mapping, leaving sessions in place.
    pub fn clear_credentials(&self) {
        self.shared.indices.lock().credentials.clear();
    }

    /// Tokens of every held session.
    pub fn tokens(&self) -> Vec<String> {
        self.shared.indices.lock().sessions.keys()
    }

    /// Number of held sessions.
    pub fn len(&self) -> usize {
        self.shared.indices.lock().sessions.len()
    }

    /// Check if the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of username mappings.
    pub fn mapped_users(&self) -> usize {
        self.shared.indices.lock().credentials.len()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.indices.lock().sessions.stats()
    }
}

impl<V> Clone for SessionStore<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
        }
    }
}

/// Sleep until the earliest deadline (or until re-armed), evict whatever has
/// expired and post it to the receiver.
async fn drive_expiry<V: SessionValue>(shared: Weak<Shared<V>>, rearm: Arc<Notify>) {
    loop {
        let next_deadline = {
            let Some(shared) = shared.upgrade() else {
                break;
            };
            let (expired, next) = {
                let mut indices = shared.indices.lock();
                let expired = indices.evict_expired(Instant::now());
                (expired, indices.sessions.next_deadline())
            };

            if !expired.is_empty() {
                debug!(count = expired.len(), "Sessions expired");
            }
            shared.post_expired(expired);
            next
        };

        match next_deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline.into()) => {}
                    _ = rearm.notified() => {}
                }
            }
            None => rearm.notified().await,
        }
    }
    debug!("Session store dropped, expiry task stopped");
}
