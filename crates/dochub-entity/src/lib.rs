//! # dochub-entity
//!
//! Domain records mirrored from the DocHub backend. Every struct in this
//! crate is either a wire record (deserialized from a backend response), a
//! request body with client-side validation, or a client-only value object
//! such as [`PendingIntent`] or [`RecentUpdate`].

pub mod activity;
pub mod file;
pub mod folder;
pub mod intent;
pub mod keyed;
pub mod permission;
pub mod user;

pub use activity::{EntryKind, EntryRef, RecentUpdate};
pub use file::{CreateFile, File, UpdateFile};
pub use folder::{CreateFolder, Folder, FolderSummary, UpdateFolder};
pub use intent::PendingIntent;
pub use keyed::Keyed;
pub use permission::{AccessLevel, AccessRole, CreateAccessRole};
pub use user::{
    CreateUser, CreateUserRole, LoginRequest, LoginResponse, UpdateUser, UpdateUserRole, User,
    UserRole, UserRoleRef,
};

/// Deserialize a nullable JSON value, mapping `null` to the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    use serde::Deserialize;
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
