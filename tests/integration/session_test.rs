//! Integration tests for the session lifecycle.

mod helpers;

use dochub_core::AppError;
use dochub_core::types::{FolderId, UserId};

#[tokio::test]
async fn test_login_survives_restart() {
    let app = helpers::TestApp::new();
    app.login("jdoe", "secret").await;

    let next = app.restart();
    let restored = next.sessions.restore().await.unwrap().unwrap();

    assert_eq!(restored.username, "jdoe");
    assert_eq!(next.sessions.token().as_deref(), Some("token-2"));
    assert!(next.state.users.contains(UserId::new(2)));
}

#[tokio::test]
async fn test_restore_without_session_is_signed_out() {
    let app = helpers::TestApp::new();
    assert!(app.sessions.restore().await.unwrap().is_none());
    assert!(!app.sessions.is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_every_cache() {
    let app = helpers::TestApp::new();
    app.login("admin", "admin").await;
    app.engine.fetch_folder(FolderId::ROOT).await.unwrap();
    app.users.load_all().await.unwrap();
    app.roles.load_all().await.unwrap();

    app.sessions.logout().await.unwrap();

    assert!(app.state.folders.is_empty());
    assert!(app.state.files.is_empty());
    assert!(app.state.users.is_empty());
    assert!(app.state.user_roles.is_empty());
    assert!(app.engine.recent_activity().is_empty());
    assert!(app.restart().sessions.restore().await.unwrap().is_none());
}

#[tokio::test]
async fn test_unauthorized_user_load_tears_down_session() {
    let app = helpers::TestApp::new();
    app.login("admin", "admin").await;
    app.engine.fetch_folder(FolderId::ROOT).await.unwrap();

    app.api.fail_next("get_users", AppError::unauthorized());
    let err = app.users.load_all().await.unwrap_err();

    assert!(err.invalidates_session());
    assert!(!app.sessions.is_authenticated());
    assert!(app.api.token().is_none());
    assert!(app.state.folders.is_empty());
    assert!(!app.session_store.path().exists());
}

#[tokio::test]
async fn test_forbidden_keeps_session() {
    let app = helpers::TestApp::new();
    app.login("jdoe", "secret").await;

    app.api.fail_next("get_user_roles", AppError::forbidden());
    let err = app.roles.load_all().await.unwrap_err();

    assert!(!err.invalidates_session());
    assert!(app.sessions.is_authenticated());
    assert_eq!(app.state.status(dochub_service::Domain::UserRoles).error(), Some(err));
}
