//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and approximate LRU eviction.

pub mod clock;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::Store;
