//! Folder domain records.

pub mod model;

pub use model::{CreateFolder, Folder, FolderSummary, UpdateFolder};
