//! Integration tests for effective access levels.

mod helpers;

use dochub_core::error::codes;
use dochub_core::types::{FolderId, UserId, UserRoleId};
use dochub_entity::{AccessLevel, CreateAccessRole};
use dochub_service::testing::access_role;

use helpers::{EDITORS, STAFF};

#[tokio::test]
async fn test_baseline_binding_reaches_every_folder() {
    let app = helpers::TestApp::new();
    let jdoe = app.login("jdoe", "secret").await;

    for id in [1, 2, 3, 4, 5] {
        assert_eq!(
            app.access
                .resolve_for_user(&jdoe, FolderId::new(id))
                .await
                .unwrap(),
            AccessLevel::Viewer,
            "folder {id}"
        );
    }
}

#[tokio::test]
async fn test_new_role_grant_raises_subtree_only() {
    let app = helpers::TestApp::new();
    app.login("admin", "admin").await;
    app.roles.load_all().await.unwrap();
    let editors = app.roles.get(UserRoleId::new(EDITORS)).await.unwrap();

    let jdoe = app.users.add_role(UserId::new(2), &editors).await.unwrap();
    app.roles
        .add_access_role(CreateAccessRole {
            folder_id: FolderId::new(3),
            user_role_id: editors.id,
            access_level: AccessLevel::Publisher,
        })
        .await
        .unwrap();

    assert_eq!(
        app.access
            .resolve_for_user(&jdoe, FolderId::new(4))
            .await
            .unwrap(),
        AccessLevel::Publisher
    );
    assert_eq!(
        app.access
            .resolve_for_user(&jdoe, FolderId::new(5))
            .await
            .unwrap(),
        AccessLevel::Viewer
    );
    assert_eq!(
        app.access
            .resolve(editors.id, FolderId::new(2))
            .await
            .unwrap(),
        AccessLevel::Unset
    );
}

#[tokio::test]
async fn test_override_and_revoke() {
    let app = helpers::TestApp::new();
    let jdoe = app.login("jdoe", "secret").await;
    app.engine.fetch_folder(FolderId::new(4)).await.unwrap();

    let deny = app
        .roles
        .add_access_role(CreateAccessRole {
            folder_id: FolderId::new(3),
            user_role_id: UserRoleId::new(STAFF),
            access_level: AccessLevel::None,
        })
        .await
        .unwrap();
    assert_eq!(
        app.access.annotate(&jdoe, FolderId::new(4)).await.unwrap(),
        AccessLevel::None
    );

    app.roles.remove_access_role(&deny).await.unwrap();
    assert_eq!(
        app.access.annotate(&jdoe, FolderId::new(4)).await.unwrap(),
        AccessLevel::Viewer
    );
    assert_eq!(
        app.state
            .folders
            .get_by_id(FolderId::new(4))
            .unwrap()
            .access_level,
        AccessLevel::Viewer
    );
}

#[tokio::test]
async fn test_baseline_binding_cannot_be_removed() {
    let app = helpers::TestApp::new();
    app.login("admin", "admin").await;

    let err = app
        .roles
        .remove_access_role(&access_role(1, STAFF, 1, AccessLevel::Viewer))
        .await
        .unwrap_err();

    assert_eq!(err.code(), codes::ROOT_ACCESS_ROLE_PROTECTED);
    assert_eq!(app.api.calls("remove_access_role"), 0);
}

#[tokio::test]
async fn test_admin_floor_without_roles() {
    let app = helpers::TestApp::new();
    let admin = app.login("admin", "admin").await;
    assert_eq!(
        app.access
            .resolve_for_user(&admin, FolderId::new(5))
            .await
            .unwrap(),
        AccessLevel::Viewer
    );
}
