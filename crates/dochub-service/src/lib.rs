//! # dochub-service
//!
//! Client-side services for DocHub. The [`CacheState`] owns every cached
//! record; the [`TreeEngine`] is the only component that edits the
//! folder/file hierarchy, and the user and user-role services maintain
//! their own caches.
//!
//! Services follow constructor injection: the transport ([`DocumentApi`])
//! and the shared state are provided at construction time via `Arc`.

pub mod api;
pub mod file;
pub mod folder;
pub mod state;
pub mod user;
pub mod user_role;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::DocumentApi;
pub use file::FileService;
pub use folder::{
    Breadcrumb, BreadcrumbResolver, Crumb, FetchOutcome, Listing, RecentEntry, RecentFeed,
    TreeEngine, Walk,
};
pub use state::{CacheState, Domain, SessionGuard};
pub use user::UserService;
pub use user_role::UserRoleService;
