//! In-process record storage.

pub mod store;

pub use store::{EntityStore, RequestStatus};
