//! `reqwest`-backed [`DocumentApi`].

use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use dochub_core::config::client::ClientConfig;
use dochub_core::error::codes;
use dochub_core::types::{AccessRoleId, FileId, FolderId, UserId, UserRoleId};
use dochub_core::{AppError, AppResult, ErrorKind};
use dochub_entity::{
    AccessRole, CreateAccessRole, CreateFile, CreateFolder, CreateUser, CreateUserRole, File,
    Folder, LoginRequest, LoginResponse, UpdateFile, UpdateFolder, UpdateUser, UpdateUserRole,
    User, UserRole, UserRoleRef,
};
use dochub_service::DocumentApi;

/// Body of every non-2xx backend response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Talks to the DocHub backend over HTTP.
pub struct HttpDocumentApi {
    client: Client,
    /// Base URL without a trailing slash.
    base_url: String,
    /// Bearer token, once logged in.
    token: RwLock<Option<String>>,
}

impl std::fmt::Debug for HttpDocumentApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDocumentApi")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token().is_some())
            .finish()
    }
}

impl HttpDocumentApi {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client: {e}"),
                    e,
                )
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// The installed bearer token.
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Backend unreachable");
            AppError::with_source(ErrorKind::Network, codes::NETWORK_ERROR, e)
        })?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Backend response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(AppError::from_server(status.as_u16(), error_code(status, &body)))
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = self.send(builder).await?;
        let body = response.bytes().await.map_err(|e| {
            AppError::with_source(ErrorKind::Network, codes::NETWORK_ERROR, e)
        })?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn empty(&self, builder: RequestBuilder) -> AppResult<()> {
        self.send(builder).await.map(|_| ())
    }
}

/// The backend's error code, falling back to the status reason when the
/// body is not an `{ "error": ... }` document.
fn error_code(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_lowercase(),
    }
}

#[async_trait]
impl DocumentApi for HttpDocumentApi {
    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        self.json(self.request(Method::POST, "/login").json(req))
            .await
    }

    async fn get_folder(&self, id: FolderId) -> AppResult<Folder> {
        self.json(self.request(Method::GET, &format!("/folders/{id}")))
            .await
    }

    async fn create_folder(&self, req: &CreateFolder) -> AppResult<Folder> {
        self.json(self.request(Method::POST, "/folders").json(req))
            .await
    }

    async fn update_folder(&self, req: &UpdateFolder) -> AppResult<Folder> {
        let path = format!("/folders/{}", req.id);
        self.json(self.request(Method::PUT, &path).json(req)).await
    }

    async fn delete_folder(&self, id: FolderId) -> AppResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/folders/{id}")))
            .await
    }

    async fn create_file(&self, req: &CreateFile) -> AppResult<File> {
        self.json(self.request(Method::POST, "/files").json(req))
            .await
    }

    async fn upload_file_data(
        &self,
        id: FileId,
        file_name: &str,
        content: Bytes,
    ) -> AppResult<()> {
        let part = Part::bytes(content.to_vec()).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        self.empty(
            self.request(Method::PUT, &format!("/file-data/{id}"))
                .multipart(form),
        )
        .await
    }

    async fn download_file_data(&self, id: FileId) -> AppResult<Bytes> {
        let response = self
            .send(self.request(Method::GET, &format!("/file-data/{id}")))
            .await?;
        response
            .bytes()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Network, codes::NETWORK_ERROR, e))
    }

    async fn update_file(&self, req: &UpdateFile) -> AppResult<File> {
        let path = format!("/files/{}", req.id);
        self.json(self.request(Method::PUT, &path).json(req)).await
    }

    async fn delete_file(&self, id: FileId) -> AppResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/files/{id}")))
            .await
    }

    async fn get_users(&self) -> AppResult<Vec<User>> {
        self.json(self.request(Method::GET, "/users")).await
    }

    async fn get_user(&self, id: UserId) -> AppResult<User> {
        self.json(self.request(Method::GET, &format!("/users/{id}")))
            .await
    }

    async fn create_user(&self, req: &CreateUser) -> AppResult<User> {
        self.json(self.request(Method::POST, "/users").json(req))
            .await
    }

    async fn update_user(&self, req: &UpdateUser) -> AppResult<User> {
        let path = format!("/users/{}", req.id);
        self.json(self.request(Method::PUT, &path).json(req)).await
    }

    async fn delete_user(&self, id: UserId) -> AppResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/users/{id}")))
            .await
    }

    async fn add_user_role(&self, user: UserId, role: &UserRoleRef) -> AppResult<User> {
        let path = format!("/users/user-roles/{user}");
        self.json(self.request(Method::POST, &path).json(role))
            .await
    }

    async fn remove_user_role(&self, user: UserId, role: &UserRoleRef) -> AppResult<User> {
        let path = format!("/users/user-roles/{user}");
        self.json(self.request(Method::DELETE, &path).json(role))
            .await
    }

    async fn get_user_roles(&self) -> AppResult<Vec<UserRole>> {
        self.json(self.request(Method::GET, "/user-roles")).await
    }

    async fn get_user_role(&self, id: UserRoleId) -> AppResult<UserRole> {
        self.json(self.request(Method::GET, &format!("/user-roles/{id}")))
            .await
    }

    async fn create_user_role(&self, req: &CreateUserRole) -> AppResult<UserRole> {
        self.json(self.request(Method::POST, "/user-roles").json(req))
            .await
    }

    async fn update_user_role(&self, req: &UpdateUserRole) -> AppResult<UserRole> {
        let path = format!("/user-roles/{}", req.id);
        self.json(self.request(Method::PUT, &path).json(req)).await
    }

    async fn delete_user_role(&self, id: UserRoleId) -> AppResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/user-roles/{id}")))
            .await
    }

    async fn add_access_role(&self, req: &CreateAccessRole) -> AppResult<AccessRole> {
        self.json(self.request(Method::POST, "/access-roles").json(req))
            .await
    }

    async fn remove_access_role(&self, id: AccessRoleId) -> AppResult<()> {
        self.empty(self.request(Method::DELETE, &format!("/access-roles/{id}")))
            .await
    }
}
