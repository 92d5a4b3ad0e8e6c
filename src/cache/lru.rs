//! Approximate LRU Module
//!
//! Selects eviction victims with a single pass over the entry map, keeping a
//! bounded window of the stalest live entries seen so far.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::cache::clock::Timestamp;
use crate::cache::CacheEntry;

// == Candidate ==
/// A live entry under consideration for eviction.
#[derive(Debug, PartialEq, Eq)]
struct Candidate<'a> {
    last_access: Timestamp,
    key: &'a str,
}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.last_access
            .cmp(&other.last_access)
            .then_with(|| self.key.cmp(other.key))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// == Eviction Window ==
/// Fixed-size set of the least recently accessed keys offered so far.
///
/// Backed by a max-heap so the least stale candidate sits on top and is the
/// one replaced when a staler entry turns up.
#[derive(Debug)]
pub(crate) struct EvictionWindow<'a> {
    limit: usize,
    heap: BinaryHeap<Candidate<'a>>,
}

impl<'a> EvictionWindow<'a> {
    // == Constructor ==
    /// Creates an empty window holding at most `limit` candidates.
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit,
            heap: BinaryHeap::with_capacity(limit),
        }
    }

    // == Offer ==
    /// Considers `key` for eviction.
    pub(crate) fn offer(&mut self, key: &'a str, last_access: Timestamp) {
        if self.limit == 0 {
            return;
        }
        let candidate = Candidate { last_access, key };
        if self.heap.len() < self.limit {
            self.heap.push(candidate);
            return;
        }
        if let Some(mut freshest) = self.heap.peek_mut() {
            if candidate < *freshest {
                *freshest = candidate;
            }
        }
    }

    // == Length ==
    /// Returns the number of candidates held.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    // == Is Empty ==
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    // == Into Keys ==
    /// Consumes the window, returning keys stalest first.
    pub(crate) fn into_keys(self) -> Vec<String> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|candidate| candidate.key.to_string())
            .collect()
    }
}

// == Eviction Plan ==
/// Keys chosen to make room for one new entry.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct EvictionPlan {
    /// Entries already past their expiration, removed opportunistically
    pub(crate) expired: Vec<String>,
    /// Live entries chosen for their staleness
    pub(crate) stale: Vec<String>,
}

impl EvictionPlan {
    /// Total number of keys the plan removes.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.expired.len() + self.stale.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.stale.is_empty()
    }
}

// == Plan Eviction ==
/// Scans `entries` once and decides which keys to drop.
///
/// Expired entries found during the scan are always returned. Live entries
/// are only returned when nothing has expired, in which case the window is
/// capped at half the map (at least one) so a single batch never empties
/// most of the cache.
pub(crate) fn plan_eviction<V>(
    entries: &HashMap<String, CacheEntry<V>>,
    now: Timestamp,
    window: usize,
) -> EvictionPlan {
    let limit = window.min((entries.len() / 2).max(1));
    let mut candidates = EvictionWindow::new(limit);
    let mut expired = Vec::new();

    for (key, entry) in entries {
        if entry.is_expired(now) {
            expired.push(key.clone());
        } else {
            candidates.offer(key, entry.last_access);
        }
    }

    if !expired.is_empty() {
        return EvictionPlan {
            expired,
            stale: Vec::new(),
        };
    }

    EvictionPlan {
        expired,
        stale: candidates.into_keys(),
    }
}
