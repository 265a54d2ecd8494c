//! Recent-activity feed entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use dochub_core::types::{FileId, FolderId};

use crate::file::File;
use crate::folder::{Folder, FolderSummary};

/// Entity kind of a feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder => write!(f, "folder"),
            Self::File => write!(f, "file"),
        }
    }
}

/// Typed reference to a cached folder or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntryRef {
    Folder(FolderId),
    File(FileId),
}

impl EntryRef {
    /// The referenced entity's kind.
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Folder(_) => EntryKind::Folder,
            Self::File(_) => EntryKind::File,
        }
    }
}

impl fmt::Display for EntryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder(id) => write!(f, "folder:{id}"),
            Self::File(id) => write!(f, "file:{id}"),
        }
    }
}

/// A reference plus the modification time it was observed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentUpdate {
    pub entry: EntryRef,
    pub updated_at: DateTime<Utc>,
}

impl From<&Folder> for RecentUpdate {
    fn from(folder: &Folder) -> Self {
        Self {
            entry: EntryRef::Folder(folder.id),
            updated_at: folder.updated_at,
        }
    }
}

impl From<&FolderSummary> for RecentUpdate {
    fn from(summary: &FolderSummary) -> Self {
        Self {
            entry: EntryRef::Folder(summary.id),
            updated_at: summary.updated_at,
        }
    }
}

impl From<&File> for RecentUpdate {
    fn from(file: &File) -> Self {
        Self {
            entry: EntryRef::File(file.id),
            updated_at: file.updated_at,
        }
    }
}
