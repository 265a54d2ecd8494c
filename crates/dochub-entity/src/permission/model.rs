//! Access-role binding records.

use serde::{Deserialize, Serialize};

use dochub_core::error::codes;
use dochub_core::types::{AccessRoleId, FolderId, UserRoleId};
use dochub_core::{AppError, AppResult};

use super::level::AccessLevel;
use crate::keyed::Keyed;

/// Binding of an access level to a (user role, folder) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRole {
    /// Unique binding identifier.
    pub id: AccessRoleId,
    /// Folder the level applies to (and is inherited below).
    pub folder_id: FolderId,
    /// Role receiving the level.
    pub user_role_id: UserRoleId,
    /// Granted level.
    pub access_level: AccessLevel,
}

impl AccessRole {
    /// Whether this is the irremovable baseline binding on the root folder.
    pub fn is_root_default(&self) -> bool {
        self.id == AccessRoleId::ROOT_DEFAULT
    }
}

impl Keyed for AccessRole {
    type Key = AccessRoleId;

    fn key(&self) -> AccessRoleId {
        self.id
    }
}

/// Body of `POST /access-roles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccessRole {
    /// Folder to bind.
    pub folder_id: FolderId,
    /// Role to bind.
    pub user_role_id: UserRoleId,
    /// Level to grant.
    pub access_level: AccessLevel,
}

impl CreateAccessRole {
    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.user_role_id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_USER_ROLE_ID));
        }
        if self.folder_id.is_sentinel() {
            return Err(AppError::validation(codes::REQUIRED_FOLDER_ID));
        }
        if self.access_level == AccessLevel::Unset {
            return Err(AppError::validation(codes::REQUIRED_ACCESS_LEVEL));
        }
        Ok(())
    }
}
