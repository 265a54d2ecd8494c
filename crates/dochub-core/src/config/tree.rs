//! Folder tree cache configuration: prefetch bounds, the recent-activity
//! window, and breadcrumb resolution limits.

use serde::{Deserialize, Serialize};

/// Bounds on the eager neighbour fetch performed after a folder loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// How many parent levels above a fetched folder are ensured.
    #[serde(default = "default_ancestor_depth")]
    pub ancestor_depth: u32,
    /// How many child levels below a fetched folder are ensured.
    #[serde(default = "default_descendant_depth")]
    pub descendant_depth: u32,
    /// Maximum children fetched per folder per fan-out step.
    #[serde(default = "default_max_children")]
    pub max_children: usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            ancestor_depth: default_ancestor_depth(),
            descendant_depth: default_descendant_depth(),
            max_children: default_max_children(),
        }
    }
}

/// Recent-activity feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Rolling freshness window in hours.
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    /// Drop entries that aged past the window when the feed is read.
    #[serde(default = "default_true")]
    pub prune_on_read: bool,
}

impl FeedConfig {
    /// The freshness window in milliseconds.
    pub fn window_millis(&self) -> i64 {
        i64::from(self.window_hours) * 3_600_000
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            prune_on_read: true,
        }
    }
}

/// Breadcrumb resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreadcrumbConfig {
    /// Maximum fetch-and-retry rounds for a single path resolution.
    #[serde(default = "default_max_fetch_rounds")]
    pub max_fetch_rounds: u32,
}

impl Default for BreadcrumbConfig {
    fn default() -> Self {
        Self {
            max_fetch_rounds: default_max_fetch_rounds(),
        }
    }
}

fn default_ancestor_depth() -> u32 {
    32
}

fn default_descendant_depth() -> u32 {
    1
}

fn default_max_children() -> usize {
    64
}

fn default_window_hours() -> u32 {
    24
}

fn default_true() -> bool {
    true
}

fn default_max_fetch_rounds() -> u32 {
    64
}
