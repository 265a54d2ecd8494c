//! User and user-role records.

pub mod model;
pub mod role;

pub use model::{CreateUser, LoginRequest, LoginResponse, UpdateUser, User};
pub use role::{CreateUserRole, UpdateUserRole, UserRole, UserRoleRef};
