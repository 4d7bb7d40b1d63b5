//! Session teardown: explicit evictions, shutdown and TTL expiry.
//!
//! Every path that takes an entry out of the store ends in `retire`, which
//! logs the connection out and announces the eviction. The store hands each
//! entry out exactly once, so each connection is logged out exactly once.

use forcelink_session::{ExpiredReceiver, SessionStore};
use forcelink_types::Connection;
use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::session::{AuthToken, SessionEntry, SessionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cause {
    Expired,
    Removed,
}

/// Evicts sessions and logs out their connections.
#[derive(Clone)]
pub struct LifecycleManager {
    store: SessionStore<SessionEntry>,
    events: broadcast::Sender<SessionEvent>,
}

impl LifecycleManager {
    pub fn new(store: SessionStore<SessionEntry>, events: broadcast::Sender<SessionEvent>) -> Self {
        Self { store, events }
    }

    /// Log out every cached session.
    ///
    /// Username mappings are dropped first so no new lookup can land on a
    /// session being torn down. Logouts run concurrently; this returns once
    /// all of them have finished, with the number of sessions closed.
    pub async fn close(&self) -> usize {
        self.store.clear_credentials();
        let tokens = self.store.tokens();
        if tokens.is_empty() {
            debug!("Close with no cached sessions");
            return 0;
        }

        // Tokens that expired since the snapshot are already being retired.
        let entries: Vec<SessionEntry> = tokens
            .iter()
            .filter_map(|token| self.store.remove(token))
            .collect();
        let closed = entries.len();

        join_all(
            entries
                .into_iter()
                .map(|entry| retire(entry, Cause::Removed, &self.events)),
        )
        .await;

        info!(sessions = closed, "All sessions closed");
        closed
    }

    /// Evict one session. Returns false if the token was not cached.
    pub async fn evict(&self, token: &AuthToken) -> bool {
        match self.store.remove(token.as_str()) {
            Some(entry) => {
                retire(entry, Cause::Removed, &self.events).await;
                true
            }
            None => false,
        }
    }
}

/// Retire entries evicted by the store's expiry timer.
///
/// Each logout runs as its own task so a slow server does not hold up the
/// next eviction. The task ends when the store is dropped.
pub fn spawn_expiry_cleanup(
    mut expired: ExpiredReceiver<SessionEntry>,
    events: broadcast::Sender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(entry) = expired.recv().await {
            let events = events.clone();
            tokio::spawn(async move {
                retire(entry, Cause::Expired, &events).await;
            });
        }
        debug!("Expiry cleanup stopped");
    })
}

async fn retire(entry: SessionEntry, cause: Cause, events: &broadcast::Sender<SessionEvent>) {
    let (token, username, connection) = entry.into_parts();
    match connection.logout().await {
        Ok(()) => info!(username = %username, token = %token, cause = ?cause, "Session logged out"),
        Err(e) => warn!(
            username = %username,
            token = %token,
            cause = ?cause,
            error = %e,
            "Logout failed"
        ),
    }

    let event = match cause {
        Cause::Expired => SessionEvent::Expired { token, username },
        Cause::Removed => SessionEvent::Removed { token, username },
    };
    // No subscribers is fine.
    let _ = events.send(event);
}
