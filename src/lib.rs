//! TTL Cache - a bounded in-process key/value cache
//!
//! Provides a capacity-bounded store with TTL expiration, approximate LRU
//! eviction and a background janitor that reclaims expired entries.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;
pub mod tier;

pub use cache::{CacheStats, Store};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tier::CacheTier;

/// Creates a store with the default TTL and sweep interval.
///
/// `capacity` defaults to [`config::DEFAULT_CAPACITY`]. Must be called from
/// within a tokio runtime, which hosts the janitor.
///
/// # Example
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ttl_cache::Result<()> {
/// let cache = ttl_cache::new_cache::<i32>(Some(2))?;
/// cache.put("a", 1)?;
/// assert_eq!(cache.get("a"), Some(1));
/// cache.stop();
/// # Ok(())
/// # }
/// ```
pub fn new_cache<V>(capacity: Option<usize>) -> Result<Store<V>>
where
    V: Clone + Send + Sync + 'static,
{
    let config = CacheConfig::default();
    let capacity = capacity.unwrap_or(config.capacity);
    Store::new(config.with_capacity(capacity))
}
