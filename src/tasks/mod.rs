//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache store.
//!
//! # Tasks
//! - Janitor: Removes expired cache entries at a fixed interval

mod janitor;

pub use janitor::{Janitor, JanitorState, Sweep};
