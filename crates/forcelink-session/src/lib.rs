//! Session cache with fixed TTL expiry.
//!
//! This crate provides the two indices behind an authenticated connector:
//! - [`SessionCache`]: token → session entry, each entry expiring a fixed
//!   time after insertion
//! - [`CredentialStore`]: username → token, one active token per user
//!
//! Both are owned by a single [`SessionStore`], which mutates them together
//! and runs a timer task that evicts expired entries. Evicted entries are
//! handed to the owner over a channel so side-effecting cleanup (closing a
//! remote connection) never runs inside the timer.
//!
//! # Example
//!
//! ```rust,ignore
//! use forcelink_session::{SessionStore, StoreConfig};
//!
//! let config = StoreConfig::default().with_ttl(Duration::from_secs(900));
//! let (store, mut expired) = SessionStore::spawn(config)?;
//!
//! tokio::spawn(async move {
//!     while let Some(entry) = expired.recv().await {
//!         // close the entry's connection
//!     }
//! });
//! ```

mod cache;
mod config;
mod credentials;
mod error;
mod store;
mod ttl;

pub use cache::{CacheStats, SessionCache};
pub use config::{DEFAULT_TTL, StoreConfig};
pub use credentials::CredentialStore;
pub use error::{Result, SessionError};
pub use store::{ExpiredReceiver, SessionStore, SessionValue, UserLookup};
pub use ttl::TtlTracker;
