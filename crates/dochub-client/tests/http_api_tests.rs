//! HTTP transport tests against a mock backend.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dochub_client::HttpDocumentApi;
use dochub_core::config::client::ClientConfig;
use dochub_core::config::tree::{FeedConfig, PrefetchConfig};
use dochub_core::error::codes;
use dochub_core::types::{AccessRoleId, FileId, FolderId, UserId, UserRoleId};
use dochub_core::ErrorKind;
use dochub_entity::{
    AccessLevel, CreateAccessRole, CreateFolder, LoginRequest, UpdateFile, UserRoleRef,
};
use dochub_service::{CacheState, DocumentApi, TreeEngine};

fn api_for(server: &MockServer) -> HttpDocumentApi {
    HttpDocumentApi::new(&ClientConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn folder_json(id: u32, name: &str, parent: u32) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "parent_folder_id": parent,
        "child_folders": null,
        "files": null,
        "last_editor_id": 1,
        "access_roles": null,
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z"
    })
}

#[tokio::test]
async fn test_login_returns_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "jdoe", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-1",
            "user_data": {"id": 2, "username": "jdoe", "is_admin": false}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let session = api
        .login(&LoginRequest {
            username: "jdoe".to_string(),
            password: "secret".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(session.token, "tok-1");
    assert_eq!(session.user_data.id, UserId::new(2));
}

#[tokio::test]
async fn test_bearer_token_is_sent_once_installed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders/3"))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_json(3, "reports", 1)))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    api.set_token(Some("tok-1".to_string()));
    let folder = api.get_folder(FolderId::new(3)).await.unwrap();

    assert_eq!(folder.name, "reports");
    assert_eq!(folder.parent_folder_id, FolderId::new(1));
    assert!(folder.files.is_empty());
}

#[tokio::test]
async fn test_error_body_code_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/folders"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"error": "folder already exists"})),
        )
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api
        .create_folder(&CreateFolder {
            name: "specs".to_string(),
            parent_folder_id: FolderId::new(1),
            last_editor_id: UserId::new(1),
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), codes::FOLDER_ALREADY_EXISTS);
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_unauthorized_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = api_for(&server).get_users().await.unwrap_err();
    assert_eq!(err.code(), codes::UNAUTHORIZED);
    assert!(err.invalidates_session());
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let server = MockServer::start().await;
    let api = api_for(&server);
    drop(server);

    let err = api.get_folder(FolderId::new(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(err.code(), codes::NETWORK_ERROR);
}

#[tokio::test]
async fn test_upload_is_multipart_put() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/file-data/9"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    api_for(&server)
        .upload_file_data(FileId::new(9), "a.txt", Bytes::from_static(b"hello"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"a.txt\""));
    assert!(body.contains("hello"));
}

#[tokio::test]
async fn test_download_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/file-data/9"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8, 1, 2, 255]))
        .mount(&server)
        .await;

    let content = api_for(&server)
        .download_file_data(FileId::new(9))
        .await
        .unwrap();
    assert_eq!(&content[..], &[0u8, 1, 2, 255]);
}

#[tokio::test]
async fn test_update_file_puts_to_its_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/files/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "name": "b.txt", "folder_id": 3, "is_published": true,
            "last_editor_id": 2, "updated_at": "2024-05-02T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = api_for(&server)
        .update_file(&UpdateFile {
            id: FileId::new(9),
            name: "b.txt".to_string(),
            folder_id: FolderId::new(3),
            is_published: true,
            last_editor_id: UserId::new(2),
        })
        .await
        .unwrap();
    assert_eq!(file.name, "b.txt");
    assert!(file.is_published);
}

#[tokio::test]
async fn test_remove_user_role_sends_role_in_delete_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/user-roles/4"))
        .and(body_json(json!({"id": 7, "name": "editors"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4, "username": "carol", "user_roles": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = api_for(&server)
        .remove_user_role(
            UserId::new(4),
            &UserRoleRef {
                id: UserRoleId::new(7),
                name: "editors".to_string(),
            },
        )
        .await
        .unwrap();
    assert!(user.user_roles.is_empty());
}

#[tokio::test]
async fn test_access_role_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/access-roles"))
        .and(body_json(json!({"folder_id": 3, "user_role_id": 7, "access_level": 3})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12, "folder_id": 3, "user_role_id": 7, "access_level": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/access-roles/12"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let binding = api
        .add_access_role(&CreateAccessRole {
            folder_id: FolderId::new(3),
            user_role_id: UserRoleId::new(7),
            access_level: AccessLevel::Uploader,
        })
        .await
        .unwrap();
    assert_eq!(binding.id, AccessRoleId::new(12));
    assert_eq!(binding.access_level, AccessLevel::Uploader);

    api.remove_access_role(binding.id).await.unwrap();
}

#[tokio::test]
async fn test_engine_fan_out_over_http() {
    let server = MockServer::start().await;
    let mut root = folder_json(1, "root", 0);
    root["child_folders"] = json!([
        {"id": 2, "name": "docs", "parent_folder_id": 1,
         "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-01T10:00:00Z"}
    ]);
    Mock::given(method("GET"))
        .and(path("/api/folders/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(root))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/folders/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(folder_json(2, "docs", 1)))
        .expect(1)
        .mount(&server)
        .await;

    let state = Arc::new(CacheState::new(&FeedConfig::default()));
    let engine = TreeEngine::new(
        Arc::new(api_for(&server)),
        state.clone(),
        PrefetchConfig::default(),
    );
    engine.fetch_folder(FolderId::new(1)).await.unwrap();

    assert!(state.folders.contains(FolderId::new(1)));
    assert!(state.folders.contains(FolderId::new(2)));
}
