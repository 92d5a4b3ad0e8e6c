//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with approximate LRU eviction,
//! TTL expiration and a background janitor.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::cache::clock::{Clock, SystemClock, Timestamp};
use crate::cache::lru::plan_eviction;
use crate::cache::{CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{Janitor, Sweep};

// == Store ==
/// Capacity-bounded cache with TTL expiration and approximate LRU eviction.
///
/// Construction starts a janitor that sweeps expired entries every
/// `cleanup_interval`. Call [`Store::stop`] (or drop the store) to halt it.
/// Share a store between tasks by wrapping it in an `Arc`.
#[derive(Debug)]
pub struct Store<V> {
    shared: Arc<Shared<V>>,
    janitor: Janitor,
}

/// State reachable from both callers and the janitor.
#[derive(Debug)]
struct Shared<V> {
    inner: RwLock<Inner<V>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

/// Everything guarded by the single store lock.
#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Entry count; must always equal `entries.len()`
    size: usize,
    stats: CacheStats,
}

impl<V> Inner<V> {
    fn check_invariant(&self) -> Result<()> {
        let actual = self.entries.len();
        if self.size != actual {
            error!(size = self.size, actual, "Cache size counter drifted");
            return Err(CacheError::InvariantViolation {
                size: self.size,
                actual,
            });
        }
        Ok(())
    }

    /// Removes `keys`, returning how many were actually present.
    fn remove_keys(&mut self, keys: &[String]) -> usize {
        let removed = keys
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        self.size = self.size.saturating_sub(removed);
        self.stats.set_total_entries(self.size);
        removed
    }

    /// Makes room for one entry.
    fn evict(&mut self, now: Timestamp, window: usize) {
        let plan = plan_eviction(&self.entries, now, window);

        let expired = self.remove_keys(&plan.expired);
        let evicted = self.remove_keys(&plan.stale);
        self.stats.record_expirations(expired);
        self.stats.record_evictions(evicted);

        debug!(expired, evicted, "Evicted entries to make room");
    }
}

impl<V> Shared<V> {
    fn remove_expired(&self) -> usize {
        let mut inner = self.inner.write();
        let now = self.clock.now();

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - inner.entries.len();

        inner.size = inner.size.saturating_sub(removed);
        let size = inner.size;
        inner.stats.set_total_entries(size);
        inner.stats.record_expirations(removed);
        removed
    }
}

impl<V: Send + Sync> Sweep for Shared<V> {
    fn sweep(&self) -> usize {
        self.remove_expired()
    }
}

impl<V> Store<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a store from `config` using the system clock and starts its janitor.
    ///
    /// # Errors
    /// - `CacheError::InvalidConfig` if `config` fails validation
    /// - `CacheError::AllocationFailed` if the entry table cannot be reserved
    /// - `CacheError::NoRuntime` if called outside a tokio runtime
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock` and starts its janitor.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let mut entries = HashMap::new();
        entries.try_reserve(config.capacity).map_err(|err| {
            error!(capacity = config.capacity, "Cannot reserve entry table");
            CacheError::AllocationFailed(format!(
                "cannot reserve {} entries: {}",
                config.capacity, err
            ))
        })?;

        let shared = Arc::new(Shared {
            inner: RwLock::new(Inner {
                entries,
                size: 0,
                stats: CacheStats::new(),
            }),
            config,
            clock,
        });

        let janitor = Janitor::new(shared.config.cleanup_interval);
        let target: Weak<dyn Sweep> = Arc::downgrade(&shared) as Weak<dyn Sweep>;
        janitor.start(target)?;

        Ok(Self { shared, janitor })
    }

    // == Get ==
    /// Retrieves a copy of the value stored under `key`.
    ///
    /// A hit records the access and extends the entry's lifetime to
    /// now + default TTL. Absent and expired keys are misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let default_ttl = self.shared.config.default_ttl;
        let mut guard = self.shared.inner.write();
        let inner = &mut *guard;
        // Read under the lock so deadlines only move forward in lock order
        let now = self.shared.clock.now();

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now, default_ttl);
                let value = entry.value.clone();
                inner.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            let removed = inner.remove_keys(&[key.to_string()]);
            inner.stats.record_expirations(removed);
        }
        inner.stats.record_miss();
        None
    }

    // == Put ==
    /// Stores `value` under `key` with the default TTL.
    pub fn put(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.put_with_ttl(key, value, self.shared.config.default_ttl)
    }

    // == Put With TTL ==
    /// Stores `value` under `key`, expiring after `ttl`.
    ///
    /// Overwriting an existing key never changes the entry count. Inserting a
    /// new key into a full store evicts first; a full store is not an error.
    ///
    /// # Errors
    /// `CacheError::InvariantViolation` if the size counter has drifted.
    pub fn put_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<()> {
        let key = key.into();
        let config = &self.shared.config;
        let mut guard = self.shared.inner.write();
        let inner = &mut *guard;
        let now = self.shared.clock.now();

        if let Some(entry) = inner.entries.get_mut(&key) {
            entry.replace(value, now, ttl);
            return inner.check_invariant();
        }

        if inner.size >= config.capacity {
            inner.evict(now, config.eviction_window);
        }
        inner.check_invariant()?;

        inner.entries.insert(key, CacheEntry::new(value, now, ttl));
        inner.size += 1;
        let size = inner.size;
        inner.stats.set_total_entries(size);
        Ok(())
    }

    // == Remove ==
    /// Deletes `key`, returning whether anything was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut inner = self.shared.inner.write();
        let removed = inner.remove_keys(&[key.to_string()]) > 0;
        inner.check_invariant()?;
        Ok(removed)
    }

    // == Flush ==
    /// Drops every entry. The janitor keeps running.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.shared.inner.write();
        inner.entries.clear();
        inner.size = 0;
        inner.stats.set_total_entries(0);
        Ok(())
    }

    // == Remove Expired ==
    /// Removes every entry whose expiration has passed.
    ///
    /// Holds the store lock for a full scan. Returns the number removed.
    pub fn remove_expired(&self) -> usize {
        self.shared.remove_expired()
    }

    // == Contains ==
    /// Checks for a live entry without touching it.
    pub fn contains(&self, key: &str) -> bool {
        let inner = self.shared.inner.read();
        let now = self.shared.clock.now();
        inner
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Time To Live ==
    /// Remaining lifetime of a live entry, without touching it.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let inner = self.shared.inner.read();
        let now = self.shared.clock.now();
        inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Stop ==
    /// Halts the janitor. Idempotent; the store stays usable.
    pub fn stop(&self) {
        self.janitor.stop();
    }

    /// The janitor bound to this store.
    pub fn janitor(&self) -> &Janitor {
        &self.janitor
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.shared.inner.read().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.shared.config.capacity
    }

    /// TTL applied by `put` and by reads.
    pub fn default_ttl(&self) -> Duration {
        self.shared.config.default_ttl
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.shared.inner.read().stats.clone()
    }

    #[cfg(test)]
    fn corrupt_size(&self, size: usize) {
        self.shared.inner.write().size = size;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    const START: Timestamp = 1_000_000_000_000;

    fn store_with_clock(capacity: usize, ttl: Duration) -> (Store<i32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let config = CacheConfig::default()
            .with_capacity(capacity)
            .with_default_ttl(ttl);
        let store = Store::with_clock(config, clock.clone()).unwrap();
        (store, clock)
    }

    #[tokio::test]
    async fn test_store_new() {
        let store: Store<i32> = Store::new(CacheConfig::default()).unwrap();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 1024);
        assert_eq!(store.default_ttl(), Duration::from_secs(600));
    }

    #[test]
    fn test_store_new_outside_runtime() {
        let result: Result<Store<i32>> = Store::new(CacheConfig::default());
        assert!(matches!(result, Err(CacheError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_store_new_unallocatable_capacity() {
        let config = CacheConfig::default().with_capacity(usize::MAX);
        let result: Result<Store<u32>> = Store::with_clock(config, Arc::new(ManualClock::new(START)));
        assert!(matches!(result, Err(CacheError::AllocationFailed(_))));
    }

    #[tokio::test]
    async fn test_store_new_invalid_config() {
        let result: Result<Store<i32>> = Store::new(CacheConfig::default().with_capacity(0));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_store_put_and_get() {
        let (store, _) = store_with_clock(100, Duration::from_secs(60));

        store.put("key1", 1).unwrap();
        assert_eq!(store.get("key1"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let (store, _) = store_with_clock(100, Duration::from_secs(60));

        assert_eq!(store.get("nonexistent"), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let (store, _) = store_with_clock(2, Duration::from_secs(60));

        store.put("key1", 1).unwrap();
        store.put("key2", 2).unwrap();
        store.put("key1", 10).unwrap();

        assert_eq!(store.get("key1"), Some(10));
        assert_eq!(store.get("key2"), Some(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
    }

    #[tokio::test]
    async fn test_store_remove() {
        let (store, _) = store_with_clock(100, Duration::from_secs(60));

        store.put("key1", 1).unwrap();
        assert!(store.remove("key1").unwrap());
        assert!(!store.remove("key1").unwrap());
        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);
    }

    #[tokio::test]
    async fn test_store_ttl_expiration() {
        let (store, clock) = store_with_clock(100, Duration::from_secs(60));

        store
            .put_with_ttl("key1", 1, Duration::from_secs(5))
            .unwrap();

        clock.advance(Duration::from_secs(5));
        assert!(store.contains("key1"));

        clock.advance(Duration::from_nanos(1));
        assert!(!store.contains("key1"));
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.len(), 0, "Expired entry is dropped on read");
        assert_eq!(store.stats().expirations, 1);
    }

    #[tokio::test]
    async fn test_store_get_extends_ttl() {
        let (store, clock) = store_with_clock(100, Duration::from_secs(10));

        store.put("key1", 1).unwrap();
        for _ in 0..10 {
            clock.advance(Duration::from_secs(8));
            assert_eq!(store.get("key1"), Some(1));
        }
        assert_eq!(store.ttl("key1"), Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_store_get_applies_default_ttl() {
        let (store, clock) = store_with_clock(100, Duration::from_secs(10));

        store
            .put_with_ttl("key1", 1, Duration::from_secs(100))
            .unwrap();
        clock.advance(Duration::from_secs(1));
        store.get("key1").unwrap();

        assert_eq!(store.ttl("key1"), Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn test_store_eviction_two_entries() {
        let (store, clock) = store_with_clock(2, Duration::from_secs(60));

        store.put("a", 1).unwrap();
        clock.advance(Duration::from_millis(1));
        store.put("b", 2).unwrap();
        clock.advance(Duration::from_millis(1));
        store.put("c", 3).unwrap();

        assert_eq!(store.len(), 2);
        assert!(!store.contains("a"));
        assert!(store.contains("b"));
        assert_eq!(store.get("c"), Some(3));
        assert_eq!(store.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_store_lru_touch_on_get() {
        let (store, clock) = store_with_clock(3, Duration::from_secs(60));

        for key in ["key1", "key2", "key3"] {
            store.put(key, 0).unwrap();
            clock.advance(Duration::from_millis(1));
        }

        // key1 becomes the most recently used
        store.get("key1").unwrap();
        clock.advance(Duration::from_millis(1));
        store.put("key4", 4).unwrap();

        assert!(store.contains("key1"));
        assert!(!store.contains("key2"));
        assert!(store.contains("key3"));
        assert!(store.contains("key4"));
    }

    #[tokio::test]
    async fn test_store_eviction_prefers_expired() {
        let (store, clock) = store_with_clock(3, Duration::from_secs(60));

        store.put("old", 1).unwrap();
        store
            .put_with_ttl("short", 2, Duration::from_secs(1))
            .unwrap();
        store.put("new", 3).unwrap();

        clock.advance(Duration::from_secs(2));
        store.put("extra", 4).unwrap();

        assert_eq!(store.len(), 3);
        assert!(store.contains("old"));
        assert!(store.contains("new"));
        assert!(store.contains("extra"));
        let stats = store.stats();
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.expirations, 1);
    }

    #[tokio::test]
    async fn test_store_eviction_batch_bounded_by_window() {
        let clock = Arc::new(ManualClock::new(START));
        let config = CacheConfig::default()
            .with_capacity(100)
            .with_eviction_window(20);
        let store: Store<usize> = Store::with_clock(config, clock.clone()).unwrap();

        for i in 0..100 {
            store.put(format!("key{i}"), i).unwrap();
            clock.advance(Duration::from_millis(1));
        }
        store.put("overflow", 100).unwrap();

        assert_eq!(store.len(), 81);
        assert!((0..20).all(|i| !store.contains(&format!("key{i}"))));
        assert!((20..100).all(|i| store.contains(&format!("key{i}"))));
    }

    #[tokio::test]
    async fn test_store_flush() {
        let (store, _) = store_with_clock(100, Duration::from_secs(60));

        store.put("key1", 1).unwrap();
        store.put("key2", 2).unwrap();
        store.flush().unwrap();

        assert!(store.is_empty());
        assert_eq!(store.get("key1"), None);

        store.flush().unwrap();
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_store_remove_expired() {
        let (store, clock) = store_with_clock(100, Duration::from_secs(60));

        store
            .put_with_ttl("key1", 1, Duration::from_secs(1))
            .unwrap();
        store
            .put_with_ttl("key2", 2, Duration::from_secs(10))
            .unwrap();

        clock.advance(Duration::from_secs(2));
        assert_eq!(store.remove_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("key2"), Some(2));
        assert_eq!(store.remove_expired(), 0);
    }

    #[tokio::test]
    async fn test_store_stats() {
        let (store, _) = store_with_clock(100, Duration::from_secs(60));

        store.put("key1", 1).unwrap();
        store.get("key1").unwrap();
        let _ = store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[tokio::test]
    async fn test_store_invariant_violation_is_reported() {
        let (store, _) = store_with_clock(100, Duration::from_secs(60));
        store.put("key1", 1).unwrap();
        store.corrupt_size(5);

        assert_eq!(
            store.put("key2", 2),
            Err(CacheError::InvariantViolation { size: 5, actual: 1 })
        );
        assert!(matches!(
            store.remove("key1"),
            Err(CacheError::InvariantViolation { .. })
        ));

        // Flush resets the bookkeeping
        store.flush().unwrap();
        store.put("key3", 3).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_store_stop_keeps_store_usable() {
        let (store, _) = store_with_clock(100, Duration::from_secs(60));

        store.stop();
        store.stop();
        store.put("key1", 1).unwrap();
        assert_eq!(store.get("key1"), Some(1));
        assert_eq!(
            store.janitor().state(),
            crate::tasks::JanitorState::Stopped
        );
    }
}
