//! Recent-activity feed.
//!
//! The feed is kept sorted by `updated_at`, newest first. New observations
//! are placed by binary search instead of re-sorting, and an entity appears
//! at most once: re-observing it with a newer timestamp moves it.

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use dochub_core::config::tree::FeedConfig;
use dochub_entity::{EntryRef, RecentUpdate};

/// Time-bounded, deduplicated list of recently modified folders and files.
#[derive(Debug, Clone)]
pub struct RecentFeed {
    entries: Vec<RecentUpdate>,
    window: Duration,
    prune_on_read: bool,
}

impl RecentFeed {
    /// Create an empty feed.
    pub fn new(config: &FeedConfig) -> Self {
        Self {
            entries: Vec::new(),
            window: Duration::milliseconds(config.window_millis()),
            prune_on_read: config.prune_on_read,
        }
    }

    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Offer an observation. Returns `true` if the feed changed.
    ///
    /// Observations outside the window are ignored. An entity already in the
    /// feed is only replaced by a strictly newer observation.
    pub fn observe(&mut self, update: RecentUpdate, now: DateTime<Utc>) -> bool {
        if update.updated_at <= self.cutoff(now) {
            return false;
        }

        if let Some(pos) = self.position(update.entry) {
            if self.entries[pos].updated_at >= update.updated_at {
                return false;
            }
            self.entries.remove(pos);
        }

        // Before any entry with an equal timestamp: latest observation first.
        let idx = self
            .entries
            .partition_point(|e| e.updated_at > update.updated_at);
        self.entries.insert(idx, update);
        trace!(entry = %update.entry, idx, "Recorded recent activity");
        true
    }

    /// Drop an entity from the feed (after it was deleted).
    pub fn remove(&mut self, entry: EntryRef) -> bool {
        match self.position(entry) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drop entries that aged past the window.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = self.cutoff(now);
        let keep = self.entries.partition_point(|e| e.updated_at > cutoff);
        let dropped = self.entries.len() - keep;
        self.entries.truncate(keep);
        dropped
    }

    /// The feed as of `now`, newest first.
    pub fn entries(&mut self, now: DateTime<Utc>) -> Vec<RecentUpdate> {
        if self.prune_on_read {
            self.prune(now);
        }
        self.entries.clone()
    }

    /// Number of entries, including any not yet pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the feed is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, entry: EntryRef) -> Option<usize> {
        self.entries.iter().position(|e| e.entry == entry)
    }
}
