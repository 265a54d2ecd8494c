//! # dochub-auth
//!
//! Authorization and session handling for the DocHub client.
//!
//! ## Modules
//!
//! - `acl`: effective access levels by nearest-ancestor override
//! - `session`: login, persisted session, logout and forced teardown

pub mod acl;
pub mod session;

pub use acl::AccessResolver;
pub use session::{SessionManager, SessionStore};
