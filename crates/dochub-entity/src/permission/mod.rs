//! Access levels and access-role bindings.

pub mod level;
pub mod model;

pub use level::AccessLevel;
pub use model::{AccessRole, CreateAccessRole};
