//! File metadata records. Content lives behind `/file-data/{id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dochub_core::error::codes;
use dochub_core::types::{FileId, FolderId, UserId};
use dochub_core::{AppError, AppResult};

use crate::keyed::Keyed;

/// A file's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// File name, unique within its folder.
    pub name: String,
    /// Containing folder.
    pub folder_id: FolderId,
    /// Whether the file is visible to viewers.
    #[serde(default)]
    pub is_published: bool,
    /// The user who last changed the file.
    #[serde(default)]
    pub last_editor_id: UserId,
    /// When the file was created.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Keyed for File {
    type Key = FileId;

    fn key(&self) -> FileId {
        self.id
    }
}

/// Body of `POST /files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// File name.
    pub name: String,
    /// Target folder.
    pub folder_id: FolderId,
    /// The uploading user.
    pub last_editor_id: UserId,
    /// Publish immediately.
    #[serde(default)]
    pub is_published: bool,
}

impl CreateFile {
    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_FILE_NAME));
        }
        if self.folder_id.is_sentinel() {
            return Err(AppError::validation(codes::REQUIRED_FOLDER_ID));
        }
        if self.last_editor_id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_LAST_EDITOR_ID));
        }
        Ok(())
    }
}

/// Body of `PUT /files/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFile {
    /// File being changed.
    pub id: FileId,
    /// New name.
    pub name: String,
    /// New containing folder (unchanged for a rename).
    pub folder_id: FolderId,
    /// New publication flag.
    pub is_published: bool,
    /// The editing user.
    pub last_editor_id: UserId,
}

impl UpdateFile {
    /// Start an update that keeps every field of `file` except the editor.
    pub fn from_file(file: &File, editor: UserId) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            folder_id: file.folder_id,
            is_published: file.is_published,
            last_editor_id: editor,
        }
    }

    /// Whether applying this update would change nothing visible.
    pub fn is_noop_for(&self, file: &File) -> bool {
        self.name.trim() == file.name
            && self.folder_id == file.folder_id
            && self.is_published == file.is_published
    }

    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_FILE_ID));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_FILE_NAME));
        }
        if self.folder_id.is_sentinel() {
            return Err(AppError::validation(codes::REQUIRED_FOLDER_ID));
        }
        if self.last_editor_id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_LAST_EDITOR_ID));
        }
        Ok(())
    }
}
