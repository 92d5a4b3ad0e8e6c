//! Error types for the cache
//!
//! Provides unified error handling using thiserror. A cache miss is never an
//! error; these variants cover construction faults and bookkeeping drift.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction parameters were rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The entry table could not be allocated
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    /// No tokio runtime was available to schedule the janitor
    #[error("No async runtime available to run the janitor")]
    NoRuntime,

    /// The size counter no longer matches the stored entry count
    #[error("Invariant violation: size counter is {size} but {actual} entries are stored")]
    InvariantViolation {
        /// Value of the size counter
        size: usize,
        /// Number of entries actually stored
        actual: usize,
    },
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
