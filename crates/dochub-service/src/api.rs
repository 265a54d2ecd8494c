//! Transport contract for the DocHub backend.

use async_trait::async_trait;
use bytes::Bytes;

use dochub_core::AppResult;
use dochub_core::types::{AccessRoleId, FileId, FolderId, UserId, UserRoleId};
use dochub_entity::{
    AccessRole, CreateAccessRole, CreateFile, CreateFolder, CreateUser, CreateUserRole, File,
    Folder, LoginRequest, LoginResponse, UpdateFile, UpdateFolder, UpdateUser, UpdateUserRole,
    User, UserRole, UserRoleRef,
};

/// One method per backend endpoint.
///
/// Implementations map a missing response to [`dochub_core::ErrorKind::Network`]
/// and a non-2xx response to [`dochub_core::AppError::from_server`], keeping
/// the backend's error code verbatim.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Install or clear the bearer token sent with every request.
    fn set_token(&self, token: Option<String>);

    /// `POST /login`
    async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse>;

    /// `GET /folders/{id}`
    async fn get_folder(&self, id: FolderId) -> AppResult<Folder>;

    /// `POST /folders`
    async fn create_folder(&self, req: &CreateFolder) -> AppResult<Folder>;

    /// `PUT /folders/{id}`
    async fn update_folder(&self, req: &UpdateFolder) -> AppResult<Folder>;

    /// `DELETE /folders/{id}`
    async fn delete_folder(&self, id: FolderId) -> AppResult<()>;

    /// `POST /files`
    async fn create_file(&self, req: &CreateFile) -> AppResult<File>;

    /// `PUT /file-data/{id}` as a multipart form with a single `file` part.
    async fn upload_file_data(&self, id: FileId, file_name: &str, content: Bytes)
    -> AppResult<()>;

    /// `GET /file-data/{id}`
    async fn download_file_data(&self, id: FileId) -> AppResult<Bytes>;

    /// `PUT /files/{id}`
    async fn update_file(&self, req: &UpdateFile) -> AppResult<File>;

    /// `DELETE /files/{id}`
    async fn delete_file(&self, id: FileId) -> AppResult<()>;

    /// `GET /users`
    async fn get_users(&self) -> AppResult<Vec<User>>;

    /// `GET /users/{id}`
    async fn get_user(&self, id: UserId) -> AppResult<User>;

    /// `POST /users`
    async fn create_user(&self, req: &CreateUser) -> AppResult<User>;

    /// `PUT /users/{id}`
    async fn update_user(&self, req: &UpdateUser) -> AppResult<User>;

    /// `DELETE /users/{id}`
    async fn delete_user(&self, id: UserId) -> AppResult<()>;

    /// `POST /users/user-roles/{userID}`
    async fn add_user_role(&self, user: UserId, role: &UserRoleRef) -> AppResult<User>;

    /// `DELETE /users/user-roles/{userID}` with the role in the body.
    async fn remove_user_role(&self, user: UserId, role: &UserRoleRef) -> AppResult<User>;

    /// `GET /user-roles`
    async fn get_user_roles(&self) -> AppResult<Vec<UserRole>>;

    /// `GET /user-roles/{id}`
    async fn get_user_role(&self, id: UserRoleId) -> AppResult<UserRole>;

    /// `POST /user-roles`
    async fn create_user_role(&self, req: &CreateUserRole) -> AppResult<UserRole>;

    /// `PUT /user-roles/{id}`
    async fn update_user_role(&self, req: &UpdateUserRole) -> AppResult<UserRole>;

    /// `DELETE /user-roles/{id}`
    async fn delete_user_role(&self, id: UserRoleId) -> AppResult<()>;

    /// `POST /access-roles`
    async fn add_access_role(&self, req: &CreateAccessRole) -> AppResult<AccessRole>;

    /// `DELETE /access-roles/{id}`
    async fn remove_access_role(&self, id: AccessRoleId) -> AppResult<()>;
}
