//! User-role cache and access-role bindings.

pub mod service;

pub use service::UserRoleService;
