//! Folder hierarchy: fetch fan-out, structural edits, the recent-activity
//! feed and breadcrumbs.

pub mod breadcrumb;
pub mod feed;
pub mod tree;

pub use breadcrumb::{Breadcrumb, BreadcrumbResolver, Crumb, Walk, walk_ancestors};
pub use feed::RecentFeed;
pub use tree::{FetchOutcome, Listing, RecentEntry, TreeEngine};
