//! File create/upload, rename/move/publish, delete and download.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};

use dochub_core::error::codes;
use dochub_core::types::{FileId, FolderId};
use dochub_core::{AppError, AppResult};
use dochub_entity::{CreateFile, File, RecentUpdate, UpdateFile};

use crate::folder::TreeEngine;
use crate::state::Domain;

/// File operations. Structural updates go through the [`TreeEngine`] so
/// folder `files` arrays stay consistent with the flat file store.
#[derive(Debug, Clone)]
pub struct FileService {
    engine: Arc<TreeEngine>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(engine: Arc<TreeEngine>) -> Self {
        Self { engine }
    }

    /// Create a file record and upload its content. The file only appears in
    /// the cache once both requests have succeeded.
    pub async fn create_file(&self, req: CreateFile, content: Bytes) -> AppResult<File> {
        let state = &self.engine.state;
        if let Err(e) = req.validate() {
            return Err(state.reject(Domain::Files, e));
        }
        if !state.folders.contains(req.folder_id) {
            return Err(state.reject(
                Domain::Files,
                AppError::not_found(codes::FOLDER_NOT_FOUND),
            ));
        }

        let req = CreateFile {
            name: req.name.trim().to_string(),
            ..req
        };
        state.begin(Domain::Files);
        let created = match self.engine.api.create_file(&req).await {
            Ok(file) => file,
            Err(e) => return Err(state.fail(Domain::Files, e).await),
        };

        let size = content.len();
        if let Err(e) = self
            .engine
            .api
            .upload_file_data(created.id, &created.name, content)
            .await
        {
            warn!(file_id = %created.id, "Upload failed after file record was created");
            return Err(state.fail(Domain::Files, e).await);
        }

        let seq = state.file_seq.issue();
        state.file_seq.try_apply(created.id, seq);
        self.apply(&created);
        state.cancel_intent();
        state.finish(Domain::Files);

        info!(file_id = %created.id, folder_id = %created.folder_id, size, "File created");
        Ok(created)
    }

    /// Rename, move or (un)publish a file.
    pub async fn update_file(&self, req: UpdateFile) -> AppResult<File> {
        let state = &self.engine.state;
        if let Err(e) = req.validate() {
            return Err(state.reject(Domain::Files, e));
        }
        if let Some(current) = state.files.get_by_id(req.id) {
            if req.is_noop_for(&current) {
                return Err(state.reject(
                    Domain::Files,
                    AppError::validation(codes::NAME_UNCHANGED),
                ));
            }
        }

        let req = UpdateFile {
            name: req.name.trim().to_string(),
            ..req
        };
        let seq = state.file_seq.issue();
        state.begin(Domain::Files);
        let updated = match self.engine.api.update_file(&req).await {
            Ok(file) => file,
            Err(e) => return Err(state.fail(Domain::Files, e).await),
        };

        if !state.file_seq.try_apply(updated.id, seq) {
            warn!(file_id = %updated.id, seq, "Discarding stale file update");
            state.cancel_intent();
            state.finish(Domain::Files);
            return Ok(state.files.get_by_id(updated.id).unwrap_or(updated));
        }

        self.apply(&updated);
        state.cancel_intent();
        state.finish(Domain::Files);

        info!(file_id = %updated.id, folder_id = %updated.folder_id, "File updated");
        Ok(updated)
    }

    /// Delete a file from `folder_id`.
    pub async fn delete_file(&self, id: FileId, folder_id: FolderId) -> AppResult<()> {
        let state = &self.engine.state;
        if id.is_unset() {
            return Err(state.reject(
                Domain::Files,
                AppError::validation(codes::REQUIRED_FILE_ID),
            ));
        }

        state.begin(Domain::Files);
        if let Err(e) = self.engine.api.delete_file(id).await {
            return Err(state.fail(Domain::Files, e).await);
        }

        self.engine.detach_file(folder_id, id);
        state.cancel_intent();
        state.finish(Domain::Files);

        info!(file_id = %id, folder_id = %folder_id, "File deleted");
        Ok(())
    }

    /// Download a file's content.
    pub async fn download(&self, id: FileId) -> AppResult<Bytes> {
        self.engine
            .state
            .track(Domain::Files, self.engine.api.download_file_data(id))
            .await
    }

    fn apply(&self, file: &File) {
        let state = &self.engine.state;
        state.files.upsert_one(file.clone());
        self.engine.place_file(file);
        state.feed().observe(RecentUpdate::from(file), Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dochub_core::config::tree::{FeedConfig, PrefetchConfig};
    use dochub_core::types::UserId;
    use dochub_entity::{EntryRef, PendingIntent};

    use crate::state::CacheState;
    use crate::testing::{FakeDocumentApi, file, folder};

    async fn setup() -> (Arc<FakeDocumentApi>, Arc<TreeEngine>, FileService) {
        let api = Arc::new(FakeDocumentApi::new());
        api.seed_folder(folder(1, "root", 0));
        api.seed_folder(folder(3, "docs", 1));
        api.seed_folder(folder(4, "old", 1));
        api.seed_file(file(5, "a.txt", 3));
        let engine = Arc::new(TreeEngine::new(
            api.clone(),
            Arc::new(CacheState::new(&FeedConfig::default())),
            PrefetchConfig::default(),
        ));
        engine.fetch_folder(FolderId::ROOT).await.unwrap();
        let files = FileService::new(engine.clone());
        (api, engine, files)
    }

    fn rename(name: &str) -> UpdateFile {
        UpdateFile {
            id: FileId::new(5),
            name: name.to_string(),
            folder_id: FolderId::new(3),
            is_published: true,
            last_editor_id: UserId::new(1),
        }
    }

    #[tokio::test]
    async fn test_rename_does_not_duplicate() {
        let (_api, engine, files) = setup().await;

        files.update_file(rename("b.txt")).await.unwrap();

        let folder = engine.state().folders.get_by_id(FolderId::new(3)).unwrap();
        assert_eq!(folder.files.len(), 1);
        assert_eq!(folder.files[0].id, FileId::new(5));
        assert_eq!(folder.files[0].name, "b.txt");
        assert_eq!(
            engine.state().files.get_by_id(FileId::new(5)).unwrap().name,
            "b.txt"
        );
    }

    #[tokio::test]
    async fn test_noop_update_is_rejected() {
        let (api, _engine, files) = setup().await;
        let err = files.update_file(rename(" a.txt ")).await.unwrap_err();
        assert_eq!(err.code(), codes::NAME_UNCHANGED);
        assert_eq!(api.calls("update_file"), 0);
    }

    #[tokio::test]
    async fn test_move_updates_both_folders() {
        let (_api, engine, files) = setup().await;
        let mut req = rename("a.txt");
        req.folder_id = FolderId::new(4);

        files.update_file(req).await.unwrap();

        let state = engine.state();
        assert!(state.folders.get_by_id(FolderId::new(3)).unwrap().files.is_empty());
        let target = state.folders.get_by_id(FolderId::new(4)).unwrap();
        assert_eq!(target.files.len(), 1);
        assert_eq!(target.files[0].folder_id, FolderId::new(4));
    }

    #[tokio::test]
    async fn test_create_uploads_then_appends() {
        let (api, engine, files) = setup().await;

        let created = files
            .create_file(
                CreateFile {
                    name: "notes.md".to_string(),
                    folder_id: FolderId::new(3),
                    last_editor_id: UserId::new(1),
                    is_published: false,
                },
                Bytes::from_static(b"# notes"),
            )
            .await
            .unwrap();

        assert_eq!(api.file_data(created.id), Some(Bytes::from_static(b"# notes")));
        let folder = engine.state().folders.get_by_id(FolderId::new(3)).unwrap();
        assert_eq!(folder.files.len(), 2);
        assert!(
            engine
                .recent_activity()
                .iter()
                .any(|e| e.entry == EntryRef::File(created.id))
        );
    }

    #[tokio::test]
    async fn test_failed_upload_does_not_append() {
        let (api, engine, files) = setup().await;
        api.fail_next("upload_file_data", AppError::from_server(500, "disk full"));

        let err = files
            .create_file(
                CreateFile {
                    name: "big.iso".to_string(),
                    folder_id: FolderId::new(3),
                    last_editor_id: UserId::new(1),
                    is_published: false,
                },
                Bytes::from_static(b"..."),
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "disk full");
        let folder = engine.state().folders.get_by_id(FolderId::new(3)).unwrap();
        assert_eq!(folder.files.len(), 1);
        assert_eq!(engine.state().files.error(), Some(err));
    }

    #[tokio::test]
    async fn test_delete_removes_file_everywhere() {
        let (_api, engine, files) = setup().await;
        files
            .delete_file(FileId::new(5), FolderId::new(3))
            .await
            .unwrap();

        let state = engine.state();
        assert!(state.folders.get_by_id(FolderId::new(3)).unwrap().files.is_empty());
        assert!(!state.files.contains(FileId::new(5)));
        assert!(
            engine
                .recent_activity()
                .iter()
                .all(|e| e.entry != EntryRef::File(FileId::new(5)))
        );
    }

    #[tokio::test]
    async fn test_delete_drops_file_from_every_listing_folder() {
        let (_api, engine, files) = setup().await;
        let state = engine.state();
        let mut stray = state.folders.get_by_id(FolderId::new(4)).unwrap();
        stray.files.push(state.files.get_by_id(FileId::new(5)).unwrap());
        state.folders.upsert_one(stray);

        files
            .delete_file(FileId::new(5), FolderId::new(3))
            .await
            .unwrap();

        assert!(state.folders.get_by_id(FolderId::new(3)).unwrap().files.is_empty());
        assert!(state.folders.get_by_id(FolderId::new(4)).unwrap().files.is_empty());
    }

    #[tokio::test]
    async fn test_stale_update_still_clears_intent() {
        let (_api, engine, files) = setup().await;
        let state = engine.state();
        state.set_intent(PendingIntent::EditFile {
            id: FileId::new(5),
            folder_id: FolderId::new(3),
        });
        state.file_seq.try_apply(FileId::new(5), dochub_cache::Seq::MAX);

        let returned = files.update_file(rename("b.txt")).await.unwrap();

        assert_eq!(returned.name, "a.txt");
        assert_eq!(state.intent(), PendingIntent::None);
    }

    #[tokio::test]
    async fn test_download_round_trips_uploaded_content() {
        let (_api, _engine, files) = setup().await;
        let created = files
            .create_file(
                CreateFile {
                    name: "c.bin".to_string(),
                    folder_id: FolderId::new(4),
                    last_editor_id: UserId::new(1),
                    is_published: true,
                },
                Bytes::from_static(&[1, 2, 3]),
            )
            .await
            .unwrap();
        let content = files.download(created.id).await.unwrap();
        assert_eq!(&content[..], &[1, 2, 3]);
    }
}
