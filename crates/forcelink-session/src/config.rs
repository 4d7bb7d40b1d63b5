//! Configuration for the session store.

use std::time::Duration;

/// Default session lifetime: 15 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_millis(15 * 60 * 1000);

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Lifetime of a session, counted from insertion. Reads do not extend it.
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the session lifetime in milliseconds.
    pub fn with_ttl_ms(self, ttl_ms: u64) -> Self {
        self.with_ttl(Duration::from_millis(ttl_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_is_fifteen_minutes() {
        assert_eq!(StoreConfig::default().ttl, Duration::from_secs(900));
    }

    #[test]
    fn test_with_ttl_ms() {
        let config = StoreConfig::new().with_ttl_ms(50);
        assert_eq!(config.ttl, Duration::from_millis(50));
    }
}
