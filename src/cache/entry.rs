//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and recency metadata.

use std::time::Duration;

use crate::cache::clock::{duration_nanos, Timestamp};

// == Cache Entry ==
/// A stored value plus its expiration and last-access timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp; the entry is absent once this has passed
    pub expires_at: Timestamp,
    /// Timestamp of the last successful read or write
    pub last_access: Timestamp,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry written at `now` that lives for `ttl`.
    pub fn new(value: V, now: Timestamp, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline(now, ttl),
            last_access: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once `now` is strictly past its expiration time.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    // == Touch ==
    /// Records an access at `now` and pushes expiration out by `ttl`.
    ///
    /// `last_access` never moves backwards, even if the clock does.
    pub fn touch(&mut self, now: Timestamp, ttl: Duration) {
        self.last_access = self.last_access.max(now);
        self.expires_at = deadline(now, ttl);
    }

    // == Replace ==
    /// Overwrites the value and restarts its lifetime.
    pub fn replace(&mut self, value: V, now: Timestamp, ttl: Duration) {
        self.value = value;
        self.touch(now, ttl);
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now: Timestamp) -> Duration {
        Duration::from_nanos(self.expires_at.saturating_sub(now))
    }
}

fn deadline(now: Timestamp, ttl: Duration) -> Timestamp {
    now.saturating_add(duration_nanos(ttl))
}
