//! Cache Tier Module
//!
//! The get/set/delete vocabulary shared by every cache layer, in-process or remote.
//! The in-memory [`Store`] is one implementation; slower tiers such as a remote
//! key/value server are configured and driven independently of it.

use std::time::Duration;

use crate::cache::Store;
use crate::error::Result;

// == Cache Tier Trait ==
/// A string-keyed cache layer.
pub trait CacheTier<V> {
    /// Fetches the value for `key`, `None` on a miss.
    fn get(&self, key: &str) -> Result<Option<V>>;

    /// Stores `value`, expiring after `expiration_secs` or the tier's default TTL.
    fn set(&self, key: &str, value: V, expiration_secs: Option<u64>) -> Result<()>;

    /// Deletes `key`, returning whether it was present.
    fn delete(&self, key: &str) -> Result<bool>;
}

impl<V> CacheTier<V> for Store<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Result<Option<V>> {
        Ok(Store::get(self, key))
    }

    fn set(&self, key: &str, value: V, expiration_secs: Option<u64>) -> Result<()> {
        match expiration_secs {
            Some(secs) => self.put_with_ttl(key, value, Duration::from_secs(secs)),
            None => self.put(key, value),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        self.remove(key)
    }
}
