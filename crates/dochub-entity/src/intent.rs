//! The single in-progress edit the user is working on.

use serde::{Deserialize, Serialize};

use dochub_core::types::{FileId, FolderId};

/// What the user is currently about to create, edit or delete.
///
/// Only one intent is active at a time; setting a new one replaces the old.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingIntent {
    /// Nothing in progress.
    #[default]
    None,
    /// Creating a sub-folder of `parent`.
    CreateFolder { parent: FolderId },
    /// Creating a file in `folder`.
    CreateFile { folder: FolderId },
    /// Renaming or moving folder `id`.
    EditFolder { id: FolderId },
    /// Renaming, moving or (un)publishing file `id`.
    EditFile { id: FileId, folder_id: FolderId },
    /// Deleting folder `id` from `parent`.
    DeleteFolder { id: FolderId, parent: FolderId },
    /// Deleting file `id` from `folder_id`.
    DeleteFile { id: FileId, folder_id: FolderId },
}

impl PendingIntent {
    /// Whether an intent is active.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The folder whose contents the intent touches, if any.
    pub fn target_folder(&self) -> Option<FolderId> {
        match *self {
            Self::None => None,
            Self::CreateFolder { parent } => Some(parent),
            Self::CreateFile { folder } => Some(folder),
            Self::EditFolder { id } => Some(id),
            Self::EditFile { folder_id, .. } => Some(folder_id),
            Self::DeleteFolder { parent, .. } => Some(parent),
            Self::DeleteFile { folder_id, .. } => Some(folder_id),
        }
    }
}
