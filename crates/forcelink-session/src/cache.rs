//! Token-keyed session cache with fixed TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::ttl::TtlTracker;

/// Session cache keyed by auth token.
///
/// Every entry expires a fixed time after it was inserted; reading an entry
/// does not extend its lifetime. The cache itself is passive: expired entries
/// stop being visible to [`get`](SessionCache::get) immediately, and are
/// physically removed by [`drain_expired`](SessionCache::drain_expired), which
/// the owning store calls from its timer.
#[derive(Debug)]
pub struct SessionCache<V> {
    entries: HashMap<String, V>,
    ttl: TtlTracker,
}

impl<V> SessionCache<V> {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: TtlTracker::new(ttl),
        }
    }

    /// Insert an entry and start its countdown. Returns the entry it replaced.
    pub fn insert(&mut self, token: impl Into<String>, value: V) -> Option<V> {
        let token = token.into();
        let deadline = self.ttl.track(&token);
        trace!(token = %token, ?deadline, "Session inserted into cache");
        self.entries.insert(token, value)
    }

    /// Get a live entry.
    pub fn get(&self, token: &str) -> Option<&V> {
        if self.ttl.is_expired(token, Instant::now()) {
            return None;
        }
        self.entries.get(token)
    }

    /// Check if a live entry exists.
    pub fn contains(&self, token: &str) -> bool {
        self.get(token).is_some()
    }

    /// Remove an entry, whether or not its deadline has passed.
    pub fn remove(&mut self, token: &str) -> Option<V> {
        self.ttl.forget(token);
        self.entries.remove(token)
    }

    /// Tokens of every entry currently held, including ones awaiting eviction.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.ttl.next_deadline()
    }

    /// Remove and return every entry whose deadline is at or before `now`.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<(String, V)> {
        self.ttl
            .drain_expired(now)
            .into_iter()
            .filter_map(|token| {
                let value = self.entries.remove(&token)?;
                Some((token, value))
            })
            .collect()
    }

    /// Get the number of held entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl.ttl()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            ttl_tracked: self.ttl.len(),
            ttl: self.ttl.ttl(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of cached sessions.
    pub size: usize,

    /// Number of sessions with a pending deadline.
    pub ttl_tracked: usize,

    /// Session lifetime.
    pub ttl: Duration,
}
