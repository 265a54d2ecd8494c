//! Folder records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dochub_core::error::codes;
use dochub_core::types::{FolderId, UserId};
use dochub_core::{AppError, AppResult};

use crate::file::File;
use crate::keyed::Keyed;
use crate::permission::{AccessLevel, AccessRole};

/// A folder as returned by `GET /folders/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name, unique among its siblings.
    pub name: String,
    /// Parent folder, [`FolderId::SENTINEL`] for the root of roots.
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub parent_folder_id: FolderId,
    /// Summaries of the direct sub-folders.
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub child_folders: Vec<FolderSummary>,
    /// Files directly inside this folder.
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub files: Vec<File>,
    /// The user who last changed the folder.
    #[serde(default)]
    pub last_editor_id: UserId,
    /// Explicit access bindings attached to this folder.
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub access_roles: Vec<AccessRole>,
    /// When the folder was created.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    /// Effective access level for the session user. Sent by the backend on
    /// `GET /folders/{id}`; recomputed locally by the access resolver.
    #[serde(default)]
    pub access_level: AccessLevel,
}

impl Folder {
    /// Whether this folder has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_folder_id.is_sentinel()
    }

    /// Build the summary stored in the parent's `child_folders`.
    pub fn summary(&self) -> FolderSummary {
        FolderSummary {
            id: self.id,
            name: self.name.clone(),
            parent_folder_id: self.parent_folder_id,
            last_editor_id: self.last_editor_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Find a child summary by id.
    pub fn child(&self, id: FolderId) -> Option<&FolderSummary> {
        self.child_folders.iter().find(|c| c.id == id)
    }

    /// Find a contained file by id.
    pub fn file(&self, id: dochub_core::types::FileId) -> Option<&File> {
        self.files.iter().find(|f| f.id == id)
    }
}

impl Keyed for Folder {
    type Key = FolderId;

    fn key(&self) -> FolderId {
        self.id
    }
}

/// The shallow form of a folder embedded in its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    /// Folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Parent folder identifier.
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub parent_folder_id: FolderId,
    /// Last editor.
    #[serde(default)]
    pub last_editor_id: UserId,
    /// Creation time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /folders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// New folder name.
    pub name: String,
    /// Folder the new folder is created in.
    pub parent_folder_id: FolderId,
    /// The creating user.
    pub last_editor_id: UserId,
}

impl CreateFolder {
    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_FOLDER_NAME));
        }
        if self.parent_folder_id.is_sentinel() {
            return Err(AppError::validation(codes::REQUIRED_PARENT_FOLDER_ID));
        }
        if self.last_editor_id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_LAST_EDITOR_ID));
        }
        Ok(())
    }
}

/// Body of `PUT /folders/{id}`: a rename, a move, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFolder {
    /// Folder being changed.
    pub id: FolderId,
    /// New name.
    pub name: String,
    /// New parent (equal to the current one for a plain rename).
    pub parent_folder_id: FolderId,
    /// The editing user.
    pub last_editor_id: UserId,
}

impl UpdateFolder {
    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_FOLDER_ID));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_FOLDER_NAME));
        }
        if self.parent_folder_id == self.id {
            return Err(AppError::validation(codes::INVALID_PARENT_FOLDER_ID));
        }
        if self.last_editor_id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_LAST_EDITOR_ID));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dochub_core::ErrorKind;

    #[test]
    fn test_deserialize_backend_payload() {
        let json = r#"{
            "id": 3,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T10:00:00Z",
            "name": "reports",
            "parent_folder_id": 1,
            "child_folders": [
                {"id": 4, "name": "q1", "parent_folder_id": 3, "last_editor_id": 2,
                 "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-01T10:00:00Z",
                 "child_folders": null, "files": null}
            ],
            "files": [
                {"id": 9, "name": "a.txt", "folder_id": 3, "last_editor_id": 2,
                 "is_published": true,
                 "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-01T11:00:00Z"}
            ],
            "last_editor_id": 2,
            "access_roles": null
        }"#;
        let folder: Folder = serde_json::from_str(json).expect("deserialize");
        assert_eq!(folder.id, FolderId::new(3));
        assert_eq!(folder.child_folders.len(), 1);
        assert_eq!(folder.child(FolderId::new(4)).map(|c| c.name.as_str()), Some("q1"));
        assert_eq!(folder.files[0].name, "a.txt");
        assert!(folder.access_roles.is_empty());
        assert_eq!(folder.access_level, AccessLevel::Unset);
    }

    #[test]
    fn test_null_parent_is_root() {
        let folder: Folder =
            serde_json::from_str(r#"{"id": 1, "name": "root", "parent_folder_id": null}"#)
                .expect("deserialize");
        assert!(folder.is_root());
        assert!(folder.child_folders.is_empty());
    }

    #[test]
    fn test_create_validation() {
        let req = CreateFolder {
            name: "   ".into(),
            parent_folder_id: FolderId::ROOT,
            last_editor_id: UserId::new(1),
        };
        let err = req.validate().expect_err("blank name");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.code(), codes::REQUIRED_FOLDER_NAME);

        let req = CreateFolder {
            name: "docs".into(),
            parent_folder_id: FolderId::SENTINEL,
            last_editor_id: UserId::new(1),
        };
        assert_eq!(
            req.validate().expect_err("no parent").code(),
            codes::REQUIRED_PARENT_FOLDER_ID
        );
    }

    #[test]
    fn test_update_cannot_parent_itself() {
        let req = UpdateFolder {
            id: FolderId::new(5),
            name: "x".into(),
            parent_folder_id: FolderId::new(5),
            last_editor_id: UserId::new(1),
        };
        assert_eq!(
            req.validate().expect_err("self parent").code(),
            codes::INVALID_PARENT_FOLDER_ID
        );
    }
}
