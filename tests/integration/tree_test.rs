//! Integration tests for browsing and editing the folder tree.

mod helpers;

use bytes::Bytes;

use dochub_core::error::codes;
use dochub_core::types::{FileId, FolderId};
use dochub_entity::{CreateFile, CreateFolder, EntryRef, UpdateFile, UpdateFolder};
use dochub_service::Crumb;

#[tokio::test]
async fn test_open_root_prefetches_one_level() {
    let app = helpers::TestApp::new();

    let listing = app.engine.open(FolderId::ROOT).await.unwrap();

    let names: Vec<&str> = listing.folders.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["archive", "projects"]);
    assert_eq!(listing.files[0].name, "readme.md");
    assert!(app.state.folders.contains(FolderId::new(2)));
    assert!(app.state.folders.contains(FolderId::new(5)));
    assert!(!app.state.folders.contains(FolderId::new(3)));
}

#[tokio::test]
async fn test_deep_breadcrumb_from_cold_cache() {
    let app = helpers::TestApp::new();

    let path = app.breadcrumbs.resolve(FolderId::new(4)).await.unwrap();

    assert_eq!(path.to_string(), "root / … / alpha / specs");
    assert_eq!(path.crumbs()[1], Crumb::Ellipsis);
    assert!(matches!(
        path.crumbs().last(),
        Some(Crumb::Folder { current: true, .. })
    ));
    assert!(app.api.folder_fetches(FolderId::new(4)) <= 1);
    assert!(app.api.folder_fetches(FolderId::new(1)) <= 1);
}

#[tokio::test]
async fn test_short_breadcrumb_is_full_path() {
    let app = helpers::TestApp::new();
    let path = app.breadcrumbs.resolve(FolderId::new(3)).await.unwrap();
    assert_eq!(path.to_string(), "root / projects / alpha");
}

#[tokio::test]
async fn test_rename_then_move_keeps_one_placement() {
    let app = helpers::TestApp::new();
    let me = app.login("admin", "admin").await;
    app.engine.fetch_folder(FolderId::new(2)).await.unwrap();
    app.engine.fetch_folder(FolderId::new(5)).await.unwrap();

    app.engine
        .update_folder(UpdateFolder {
            id: FolderId::new(3),
            name: "beta".to_string(),
            parent_folder_id: FolderId::new(2),
            last_editor_id: me.id,
        })
        .await
        .unwrap();
    app.engine
        .update_folder(UpdateFolder {
            id: FolderId::new(3),
            name: "beta".to_string(),
            parent_folder_id: FolderId::new(5),
            last_editor_id: me.id,
        })
        .await
        .unwrap();

    let projects = app.state.folders.get_by_id(FolderId::new(2)).unwrap();
    let archive = app.state.folders.get_by_id(FolderId::new(5)).unwrap();
    assert!(projects.child(FolderId::new(3)).is_none());
    assert_eq!(
        archive.child(FolderId::new(3)).map(|c| c.name.as_str()),
        Some("beta")
    );

    let path = app.breadcrumbs.resolve(FolderId::new(4)).await.unwrap();
    assert_eq!(path.to_string(), "root / … / beta / specs");
}

#[tokio::test]
async fn test_create_folder_then_delete_it() {
    let app = helpers::TestApp::new();
    let me = app.login("admin", "admin").await;
    app.engine.fetch_folder(FolderId::new(5)).await.unwrap();

    let created = app
        .engine
        .create_folder(CreateFolder {
            name: "  2023  ".to_string(),
            parent_folder_id: FolderId::new(5),
            last_editor_id: me.id,
        })
        .await
        .unwrap();
    assert_eq!(created.name, "2023");
    let archive = app.state.folders.get_by_id(FolderId::new(5)).unwrap();
    assert_eq!(archive.child_folders.len(), 1);

    app.engine
        .delete_folder(created.id, FolderId::new(5))
        .await
        .unwrap();
    let archive = app.state.folders.get_by_id(FolderId::new(5)).unwrap();
    assert!(archive.child_folders.is_empty());
    assert!(!app.state.folders.contains(created.id));
}

#[tokio::test]
async fn test_non_empty_folder_delete_leaves_cache_intact() {
    let app = helpers::TestApp::new();
    app.login("admin", "admin").await;
    app.engine.fetch_folder(FolderId::new(3)).await.unwrap();

    let err = app
        .engine
        .delete_folder(FolderId::new(3), FolderId::new(2))
        .await
        .unwrap_err();

    assert_eq!(err.code(), codes::FOLDER_NOT_EMPTY);
    let projects = app.state.folders.get_by_id(FolderId::new(2)).unwrap();
    assert!(projects.child(FolderId::new(3)).is_some());
    assert!(app.state.folders.contains(FolderId::new(4)));
}

#[tokio::test]
async fn test_upload_download_and_recent_activity() {
    let app = helpers::TestApp::new();
    let me = app.login("admin", "admin").await;
    app.engine.fetch_folder(FolderId::new(4)).await.unwrap();

    let created = app
        .files
        .create_file(
            CreateFile {
                name: "design.md".to_string(),
                folder_id: FolderId::new(4),
                last_editor_id: me.id,
                is_published: false,
            },
            Bytes::from_static(b"# Design"),
        )
        .await
        .unwrap();

    let specs = app.state.folders.get_by_id(FolderId::new(4)).unwrap();
    assert!(specs.file(created.id).is_some());
    assert_eq!(&app.files.download(created.id).await.unwrap()[..], b"# Design");

    let recent = app.engine.recent_activity();
    let entry = recent
        .iter()
        .find(|e| e.entry == EntryRef::File(created.id))
        .unwrap();
    assert_eq!(entry.location, FolderId::new(4));
}

#[tokio::test]
async fn test_file_rename_and_publish() {
    let app = helpers::TestApp::new();
    let me = app.login("admin", "admin").await;
    app.engine.fetch_folder(FolderId::new(3)).await.unwrap();
    let plan = app.state.files.get_by_id(FileId::new(21)).unwrap();

    let mut req = UpdateFile::from_file(&plan, me.id);
    req.name = "roadmap.txt".to_string();
    req.is_published = false;
    app.files.update_file(req).await.unwrap();

    let alpha = app.state.folders.get_by_id(FolderId::new(3)).unwrap();
    assert_eq!(alpha.files.len(), 1);
    assert_eq!(alpha.files[0].name, "roadmap.txt");
    assert!(!alpha.files[0].is_published);

    let unchanged = UpdateFile::from_file(&alpha.files[0], me.id);
    let err = app.files.update_file(unchanged).await.unwrap_err();
    assert_eq!(err.code(), codes::NAME_UNCHANGED);
}
