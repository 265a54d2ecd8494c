//! User-role records.

use serde::{Deserialize, Serialize};

use dochub_core::error::codes;
use dochub_core::types::{FolderId, UserRoleId};
use dochub_core::{AppError, AppResult};

use crate::keyed::Keyed;
use crate::permission::AccessRole;

/// A named group of access bindings assigned to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// Unique role identifier.
    pub id: UserRoleId,
    /// Role name, unique.
    pub name: String,
    /// Folder bindings held by the role.
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub access_roles: Vec<AccessRole>,
}

impl UserRole {
    /// The explicit binding on `folder`, if any.
    pub fn binding_for(&self, folder: FolderId) -> Option<&AccessRole> {
        self.access_roles.iter().find(|a| a.folder_id == folder)
    }

    /// Reference form used by the user-role assignment endpoints.
    pub fn to_ref(&self) -> UserRoleRef {
        UserRoleRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

impl Keyed for UserRole {
    type Key = UserRoleId;

    fn key(&self) -> UserRoleId {
        self.id
    }
}

/// Role reference sent to `POST`/`DELETE /users/user-roles/{userID}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleRef {
    pub id: UserRoleId,
    #[serde(default)]
    pub name: String,
}

/// Body of `POST /user-roles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRole {
    pub name: String,
}

impl CreateUserRole {
    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_USER_ROLE_NAME));
        }
        Ok(())
    }
}

/// Body of `PUT /user-roles/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRole {
    pub id: UserRoleId,
    pub name: String,
}

impl UpdateUserRole {
    /// Reject requests the backend would refuse, or that change nothing.
    pub fn validate_against(&self, current: Option<&UserRole>) -> AppResult<()> {
        if self.id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_USER_ROLE_ID));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_USER_ROLE_NAME));
        }
        if current.is_some_and(|role| role.name == self.name.trim()) {
            return Err(AppError::validation(codes::NAME_UNCHANGED));
        }
        Ok(())
    }
}
