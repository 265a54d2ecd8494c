//! Per-id request sequencing.
//!
//! Each request that may upsert a record draws a sequence number before it
//! is sent. When the response arrives it is applied only if no response
//! with a higher number has already been applied for the same id.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::debug;

/// A request sequence number.
pub type Seq = u64;

/// Tracks the highest applied sequence number per id.
#[derive(Debug)]
pub struct SequenceTracker<K: Eq + Hash> {
    next: AtomicU64,
    applied: DashMap<K, Seq>,
}

impl<K: Eq + Hash + Copy + Debug> SequenceTracker<K> {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            applied: DashMap::new(),
        }
    }

    /// Draw the next sequence number. Numbers are monotonic across all ids.
    pub fn issue(&self) -> Seq {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `seq` as applied for `key` unless a newer one already was.
    ///
    /// Returns `false` when the response is stale and must be discarded.
    pub fn try_apply(&self, key: K, seq: Seq) -> bool {
        let mut slot = self.applied.entry(key).or_insert(0);
        if seq < *slot {
            debug!(?key, seq, applied = *slot, "Rejected stale response");
            return false;
        }
        *slot = seq;
        true
    }

    /// Whether `seq` would currently be accepted for `key`.
    pub fn is_current(&self, key: K, seq: Seq) -> bool {
        self.applied.get(&key).is_none_or(|applied| seq >= *applied)
    }

    /// Forget an id (after delete).
    pub fn forget(&self, key: K) {
        self.applied.remove(&key);
    }

    /// Forget every id.
    pub fn clear(&self) {
        self.applied.clear();
    }
}

impl<K: Eq + Hash + Copy + Debug> Default for SequenceTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_response_is_rejected() {
        let tracker = SequenceTracker::new();
        let older = tracker.issue();
        let newer = tracker.issue();
        assert!(tracker.try_apply(7u32, newer));
        assert!(!tracker.try_apply(7u32, older));
        assert!(!tracker.is_current(7u32, older));
    }

    #[test]
    fn test_ids_are_independent() {
        let tracker = SequenceTracker::new();
        let a = tracker.issue();
        let b = tracker.issue();
        assert!(tracker.try_apply(1u32, b));
        assert!(tracker.try_apply(2u32, a));
    }

    #[test]
    fn test_forget_resets() {
        let tracker = SequenceTracker::new();
        let a = tracker.issue();
        let b = tracker.issue();
        assert!(tracker.try_apply(1u32, b));
        tracker.forget(1);
        assert!(tracker.try_apply(1u32, a));
    }
}
