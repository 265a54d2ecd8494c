//! Session lifecycle: login, restore, profile updates and logout.

pub mod manager;
pub mod store;

pub use manager::SessionManager;
pub use store::SessionStore;
