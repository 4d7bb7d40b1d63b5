//! Deadline tracking for fixed-lifetime expiry.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

/// Tracks one fixed deadline per key.
///
/// Deadlines live in a min-heap so the earliest one is always at hand for the
/// expiry timer. Re-tracking or forgetting a key does not touch the heap; the
/// stale heap slot is recognised by its generation and skipped lazily.
#[derive(Debug)]
pub struct TtlTracker {
    /// Heap of (deadline, generation, key), earliest first.
    heap: BinaryHeap<Reverse<(Instant, u64, String)>>,

    /// Live deadline and generation for each tracked key.
    live: HashMap<String, (Instant, u64)>,

    next_generation: u64,

    ttl: Duration,
}

impl TtlTracker {
    /// Create a tracker whose deadlines lie `ttl` after tracking.
    pub fn new(ttl: Duration) -> Self {
        Self {
            heap: BinaryHeap::new(),
            live: HashMap::new(),
            next_generation: 0,
            ttl,
        }
    }

    /// Start the countdown for a key and return its deadline.
    ///
    /// Tracking an already tracked key restarts its countdown.
    pub fn track(&mut self, key: &str) -> Instant {
        self.track_at(key, Instant::now())
    }

    fn track_at(&mut self, key: &str, now: Instant) -> Instant {
        let deadline = now + self.ttl;
        let generation = self.next_generation;
        self.next_generation += 1;

        self.live.insert(key.to_string(), (deadline, generation));
        self.heap.push(Reverse((deadline, generation, key.to_string())));
        deadline
    }

    /// Stop tracking a key.
    pub fn forget(&mut self, key: &str) {
        self.live.remove(key);
    }

    /// Check whether a key's deadline has passed. Untracked keys count as expired.
    pub fn is_expired(&self, key: &str, now: Instant) -> bool {
        match self.live.get(key) {
            None => true,
            Some((deadline, _)) => *deadline <= now,
        }
    }

    /// Deadline of a tracked key.
    pub fn deadline(&self, key: &str) -> Option<Instant> {
        self.live.get(key).map(|(deadline, _)| *deadline)
    }

    /// Earliest live deadline, discarding stale heap slots on the way.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        while let Some(Reverse((deadline, generation, key))) = self.heap.peek() {
            if self.is_current(key, *generation) {
                return Some(*deadline);
            }
            self.heap.pop();
        }
        None
    }

    /// Remove every key whose deadline is at or before `now`, earliest first.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<String> {
        let mut expired = Vec::new();
        while let Some(Reverse((deadline, generation, key))) = self.heap.peek() {
            if *deadline > now {
                break;
            }
            let current = self.is_current(key, *generation);
            let Some(Reverse((_, _, key))) = self.heap.pop() else {
                break;
            };
            if current {
                self.live.remove(&key);
                expired.push(key);
            }
        }
        expired
    }

    fn is_current(&self, key: &str, generation: u64) -> bool {
        matches!(self.live.get(key), Some((_, g)) if *g == generation)
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Check if there are no tracked keys.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Clear all tracking data.
    pub fn clear(&mut self) {
        self.live.clear();
        self.heap.clear();
    }

    /// Get the configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
