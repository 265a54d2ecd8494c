//! In-memory [`DocumentApi`] for tests.
//!
//! [`FakeDocumentApi`] behaves like a small backend: it keeps flat folder,
//! file, user and role tables, assembles nested folder payloads on read, and
//! enforces the backend's uniqueness and emptiness rules. Tests can queue
//! failures per endpoint, count calls, and hold folder fetches at a gate to
//! control interleaving.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use dochub_core::error::codes;
use dochub_core::types::{AccessRoleId, FileId, FolderId, UserId, UserRoleId};
use dochub_core::{AppError, AppResult};
use dochub_entity::{
    AccessLevel, AccessRole, CreateAccessRole, CreateFile, CreateFolder, CreateUser,
    CreateUserRole, File, Folder, LoginRequest, LoginResponse, UpdateFile, UpdateFolder,
    UpdateUser, UpdateUserRole, User, UserRole, UserRoleRef,
};

use crate::api::DocumentApi;

/// Build a bare folder record updated now.
pub fn folder(id: u32, name: &str, parent: u32) -> Folder {
    folder_at(id, name, parent, Utc::now())
}

/// Build a bare folder record with an explicit modification time.
pub fn folder_at(id: u32, name: &str, parent: u32, updated_at: DateTime<Utc>) -> Folder {
    Folder {
        id: FolderId::new(id),
        name: name.to_string(),
        parent_folder_id: FolderId::new(parent),
        child_folders: Vec::new(),
        files: Vec::new(),
        last_editor_id: UserId::new(1),
        access_roles: Vec::new(),
        created_at: updated_at,
        updated_at,
        access_level: AccessLevel::Unset,
    }
}

/// Build a file record updated now.
pub fn file(id: u32, name: &str, folder_id: u32) -> File {
    file_at(id, name, folder_id, Utc::now())
}

/// Build a file record with an explicit modification time.
pub fn file_at(id: u32, name: &str, folder_id: u32, updated_at: DateTime<Utc>) -> File {
    File {
        id: FileId::new(id),
        name: name.to_string(),
        folder_id: FolderId::new(folder_id),
        is_published: true,
        last_editor_id: UserId::new(1),
        created_at: updated_at,
        updated_at,
    }
}

/// Build a user record.
pub fn user(id: u32, username: &str, is_admin: bool) -> User {
    User {
        id: UserId::new(id),
        username: username.to_string(),
        is_admin,
        first_name: username.to_string(),
        last_name: "Test".to_string(),
        user_roles: Vec::new(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Build a user-role record without bindings.
pub fn user_role(id: u32, name: &str) -> UserRole {
    UserRole {
        id: UserRoleId::new(id),
        name: name.to_string(),
        access_roles: Vec::new(),
    }
}

/// Build an access-role binding.
pub fn access_role(id: u32, role: u32, folder_id: u32, level: AccessLevel) -> AccessRole {
    AccessRole {
        id: AccessRoleId::new(id),
        folder_id: FolderId::new(folder_id),
        user_role_id: UserRoleId::new(role),
        access_level: level,
    }
}

#[derive(Debug, Default)]
struct FakeServer {
    next_id: u32,
    folders: BTreeMap<FolderId, Folder>,
    files: BTreeMap<FileId, File>,
    data: HashMap<FileId, Bytes>,
    users: BTreeMap<UserId, User>,
    passwords: HashMap<String, (String, UserId)>,
    roles: BTreeMap<UserRoleId, UserRole>,
    access_roles: BTreeMap<AccessRoleId, AccessRole>,
}

impl FakeServer {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn folder_view(&self, id: FolderId) -> AppResult<Folder> {
        let mut folder = self
            .folders
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::from_server(400, codes::FOLDER_NOT_FOUND))?;
        folder.child_folders = self
            .folders
            .values()
            .filter(|f| f.parent_folder_id == id)
            .map(Folder::summary)
            .collect();
        folder.files = self
            .files
            .values()
            .filter(|f| f.folder_id == id)
            .cloned()
            .collect();
        folder.access_roles = self
            .access_roles
            .values()
            .filter(|a| a.folder_id == id)
            .cloned()
            .collect();
        Ok(folder)
    }

    fn role_view(&self, id: UserRoleId) -> AppResult<UserRole> {
        let mut role = self
            .roles
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::from_server(400, codes::USER_ROLE_NOT_FOUND))?;
        role.access_roles = self
            .access_roles
            .values()
            .filter(|a| a.user_role_id == id)
            .cloned()
            .collect();
        Ok(role)
    }

    fn user_view(&self, id: UserId) -> AppResult<User> {
        let mut user = self
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::from_server(400, codes::USER_NOT_FOUND))?;
        user.user_roles = user
            .user_roles
            .iter()
            .filter_map(|r| self.role_view(r.id).ok())
            .collect();
        Ok(user)
    }

    fn folder_name_taken(&self, parent: FolderId, name: &str, except: FolderId) -> bool {
        self.folders
            .values()
            .any(|f| f.parent_folder_id == parent && f.name == name && f.id != except)
    }

    fn file_name_taken(&self, folder: FolderId, name: &str, except: FileId) -> bool {
        self.files
            .values()
            .any(|f| f.folder_id == folder && f.name == name && f.id != except)
    }
}

/// A scripted, in-memory backend.
#[derive(Debug, Default)]
pub struct FakeDocumentApi {
    server: Mutex<FakeServer>,
    calls: Mutex<HashMap<&'static str, usize>>,
    folder_fetches: Mutex<HashMap<FolderId, usize>>,
    failures: Mutex<HashMap<&'static str, VecDeque<AppError>>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    token: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl FakeDocumentApi {
    /// Create an empty backend. Generated ids start at 1000.
    pub fn new() -> Self {
        let api = Self::default();
        lock(&api.server).next_id = 1000;
        api
    }

    fn server(&self) -> MutexGuard<'_, FakeServer> {
        lock(&self.server)
    }

    /// Store a folder. Its embedded arrays are ignored; they are rebuilt on read.
    pub fn seed_folder(&self, folder: Folder) {
        self.server().folders.insert(folder.id, folder);
    }

    /// Store a file.
    pub fn seed_file(&self, file: File) {
        self.server().files.insert(file.id, file);
    }

    /// Store a user with a login password.
    pub fn seed_user(&self, user: User, password: &str) {
        let mut server = self.server();
        server
            .passwords
            .insert(user.username.clone(), (password.to_string(), user.id));
        server.users.insert(user.id, user);
    }

    /// Store a user role.
    pub fn seed_user_role(&self, role: UserRole) {
        self.server().roles.insert(role.id, role);
    }

    /// Store an access-role binding.
    pub fn seed_access_role(&self, binding: AccessRole) {
        self.server().access_roles.insert(binding.id, binding);
    }

    /// Read a folder as the backend would return it.
    pub fn server_folder(&self, id: FolderId) -> Option<Folder> {
        self.server().folder_view(id).ok()
    }

    /// Uploaded content of a file.
    pub fn file_data(&self, id: FileId) -> Option<Bytes> {
        self.server().data.get(&id).cloned()
    }

    /// Fail the next call to `endpoint` with `err`.
    pub fn fail_next(&self, endpoint: &'static str, err: AppError) {
        lock(&self.failures)
            .entry(endpoint)
            .or_default()
            .push_back(err);
    }

    /// Number of calls made to `endpoint`.
    pub fn calls(&self, endpoint: &str) -> usize {
        lock(&self.calls).get(endpoint).copied().unwrap_or(0)
    }

    /// Number of `GET /folders/{id}` calls for `id`.
    pub fn folder_fetches(&self, id: FolderId) -> usize {
        lock(&self.folder_fetches).get(&id).copied().unwrap_or(0)
    }

    /// Make folder fetches wait at a gate after reading the backend state.
    /// A failure queued for `get_folder` is reported once the gate opens.
    pub fn hold_fetches(&self) {
        *lock(&self.gate) = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held folder fetches complete.
    pub fn release_fetches(&self, n: usize) {
        if let Some(gate) = lock(&self.gate).as_ref() {
            gate.add_permits(n);
        }
    }

    /// The currently installed bearer token.
    pub fn token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    fn enter(&self, endpoint: &'static str) -> AppResult<()> {
        *lock(&self.calls).entry(endpoint).or_default() += 1;
        match lock(&self.failures)
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentApi for FakeDocumentApi {
    fn set_token(&self, token: Option<String>) {
        *lock(&self.token) = token;
    }

    async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        self.enter("login")?;
        let server = self.server();
        let (password, id) = server
            .passwords
            .get(&req.username)
            .cloned()
            .ok_or_else(|| AppError::from_server(400, codes::USER_NOT_FOUND))?;
        if password != req.password {
            return Err(AppError::from_server(400, codes::INCORRECT_PASSWORD));
        }
        Ok(LoginResponse {
            token: format!("token-{id}"),
            user_data: server.user_view(id)?,
        })
    }

    async fn get_folder(&self, id: FolderId) -> AppResult<Folder> {
        *lock(&self.folder_fetches).entry(id).or_default() += 1;
        let snapshot = self.server().folder_view(id);
        let gate = lock(&self.gate).clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        self.enter("get_folder")?;
        snapshot
    }

    async fn create_folder(&self, req: &CreateFolder) -> AppResult<Folder> {
        self.enter("create_folder")?;
        let mut server = self.server();
        if !server.folders.contains_key(&req.parent_folder_id) {
            return Err(AppError::from_server(400, codes::INVALID_PARENT_FOLDER_ID));
        }
        if server.folder_name_taken(req.parent_folder_id, &req.name, FolderId::SENTINEL) {
            return Err(AppError::from_server(400, codes::FOLDER_ALREADY_EXISTS));
        }
        let id = server.allocate();
        let mut created = folder(id, req.name.trim(), req.parent_folder_id.get());
        created.last_editor_id = req.last_editor_id;
        server.folders.insert(created.id, created.clone());
        server.folder_view(created.id)
    }

    async fn update_folder(&self, req: &UpdateFolder) -> AppResult<Folder> {
        self.enter("update_folder")?;
        let mut server = self.server();
        if !server.folders.contains_key(&req.parent_folder_id) {
            return Err(AppError::from_server(400, codes::INVALID_PARENT_FOLDER_ID));
        }
        if server.folder_name_taken(req.parent_folder_id, &req.name, req.id) {
            return Err(AppError::from_server(400, codes::FOLDER_ALREADY_EXISTS));
        }
        let stored = server
            .folders
            .get_mut(&req.id)
            .ok_or_else(|| AppError::from_server(400, codes::FOLDER_NOT_FOUND))?;
        stored.name = req.name.trim().to_string();
        stored.parent_folder_id = req.parent_folder_id;
        stored.last_editor_id = req.last_editor_id;
        stored.updated_at = Utc::now();
        server.folder_view(req.id)
    }

    async fn delete_folder(&self, id: FolderId) -> AppResult<()> {
        self.enter("delete_folder")?;
        let mut server = self.server();
        let view = server.folder_view(id)?;
        if !view.child_folders.is_empty() || !view.files.is_empty() {
            return Err(AppError::from_server(400, codes::FOLDER_NOT_EMPTY));
        }
        server.folders.remove(&id);
        Ok(())
    }

    async fn create_file(&self, req: &CreateFile) -> AppResult<File> {
        self.enter("create_file")?;
        let mut server = self.server();
        if !server.folders.contains_key(&req.folder_id) {
            return Err(AppError::from_server(400, codes::FOLDER_NOT_FOUND));
        }
        if server.file_name_taken(req.folder_id, &req.name, FileId::new(0)) {
            return Err(AppError::from_server(400, codes::FILE_ALREADY_EXISTS));
        }
        let id = server.allocate();
        let mut created = file(id, req.name.trim(), req.folder_id.get());
        created.is_published = req.is_published;
        created.last_editor_id = req.last_editor_id;
        server.files.insert(created.id, created.clone());
        Ok(created)
    }

    async fn upload_file_data(
        &self,
        id: FileId,
        _file_name: &str,
        content: Bytes,
    ) -> AppResult<()> {
        self.enter("upload_file_data")?;
        let mut server = self.server();
        if !server.files.contains_key(&id) {
            return Err(AppError::from_server(400, codes::FILE_NOT_FOUND));
        }
        server.data.insert(id, content);
        Ok(())
    }

    async fn download_file_data(&self, id: FileId) -> AppResult<Bytes> {
        self.enter("download_file_data")?;
        self.server()
            .data
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::from_server(400, codes::FILE_NOT_FOUND))
    }

    async fn update_file(&self, req: &UpdateFile) -> AppResult<File> {
        self.enter("update_file")?;
        let mut server = self.server();
        if !server.folders.contains_key(&req.folder_id) {
            return Err(AppError::from_server(400, codes::FOLDER_NOT_FOUND));
        }
        if server.file_name_taken(req.folder_id, &req.name, req.id) {
            return Err(AppError::from_server(400, codes::FILE_ALREADY_EXISTS));
        }
        let stored = server
            .files
            .get_mut(&req.id)
            .ok_or_else(|| AppError::from_server(400, codes::FILE_NOT_FOUND))?;
        stored.name = req.name.trim().to_string();
        stored.folder_id = req.folder_id;
        stored.is_published = req.is_published;
        stored.last_editor_id = req.last_editor_id;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_file(&self, id: FileId) -> AppResult<()> {
        self.enter("delete_file")?;
        let mut server = self.server();
        server
            .files
            .remove(&id)
            .ok_or_else(|| AppError::from_server(400, codes::FILE_NOT_FOUND))?;
        server.data.remove(&id);
        Ok(())
    }

    async fn get_users(&self) -> AppResult<Vec<User>> {
        self.enter("get_users")?;
        let server = self.server();
        server.users.keys().map(|id| server.user_view(*id)).collect()
    }

    async fn get_user(&self, id: UserId) -> AppResult<User> {
        self.enter("get_user")?;
        self.server().user_view(id)
    }

    async fn create_user(&self, req: &CreateUser) -> AppResult<User> {
        self.enter("create_user")?;
        let mut server = self.server();
        if server.passwords.contains_key(&req.username) {
            return Err(AppError::from_server(400, codes::USER_ALREADY_EXISTS));
        }
        let id = server.allocate();
        let mut created = user(id, &req.username, req.is_admin);
        created.first_name = req.first_name.clone();
        created.last_name = req.last_name.clone();
        server
            .passwords
            .insert(req.username.clone(), (req.password.clone(), created.id));
        server.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, req: &UpdateUser) -> AppResult<User> {
        self.enter("update_user")?;
        let mut server = self.server();
        let stored = server
            .users
            .get_mut(&req.id)
            .ok_or_else(|| AppError::from_server(400, codes::USER_NOT_FOUND))?;
        let old_username = std::mem::replace(&mut stored.username, req.username.clone());
        stored.first_name = req.first_name.clone();
        stored.last_name = req.last_name.clone();
        stored.is_admin = req.is_admin;
        stored.updated_at = Utc::now();
        if let Some((password, id)) = server.passwords.remove(&old_username) {
            let password = req.password.clone().unwrap_or(password);
            server.passwords.insert(req.username.clone(), (password, id));
        }
        server.user_view(req.id)
    }

    async fn delete_user(&self, id: UserId) -> AppResult<()> {
        self.enter("delete_user")?;
        let mut server = self.server();
        let removed = server
            .users
            .remove(&id)
            .ok_or_else(|| AppError::from_server(400, codes::USER_NOT_FOUND))?;
        server.passwords.remove(&removed.username);
        Ok(())
    }

    async fn add_user_role(&self, user_id: UserId, role: &UserRoleRef) -> AppResult<User> {
        self.enter("add_user_role")?;
        let mut server = self.server();
        let assigned = server.role_view(role.id)?;
        let stored = server
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::from_server(400, codes::USER_NOT_FOUND))?;
        if stored.has_role(role.id) {
            return Err(AppError::from_server(400, codes::USER_ROLE_ALREADY_EXISTS));
        }
        stored.user_roles.push(assigned);
        server.user_view(user_id)
    }

    async fn remove_user_role(&self, user_id: UserId, role: &UserRoleRef) -> AppResult<User> {
        self.enter("remove_user_role")?;
        let mut server = self.server();
        let stored = server
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::from_server(400, codes::USER_NOT_FOUND))?;
        if !stored.has_role(role.id) {
            return Err(AppError::from_server(400, codes::USER_ROLE_NOT_FOUND));
        }
        stored.user_roles.retain(|r| r.id != role.id);
        server.user_view(user_id)
    }

    async fn get_user_roles(&self) -> AppResult<Vec<UserRole>> {
        self.enter("get_user_roles")?;
        let server = self.server();
        server.roles.keys().map(|id| server.role_view(*id)).collect()
    }

    async fn get_user_role(&self, id: UserRoleId) -> AppResult<UserRole> {
        self.enter("get_user_role")?;
        self.server().role_view(id)
    }

    async fn create_user_role(&self, req: &CreateUserRole) -> AppResult<UserRole> {
        self.enter("create_user_role")?;
        let mut server = self.server();
        if server.roles.values().any(|r| r.name == req.name) {
            return Err(AppError::from_server(400, codes::USER_ROLE_ALREADY_EXISTS));
        }
        let id = server.allocate();
        let created = user_role(id, req.name.trim());
        server.roles.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user_role(&self, req: &UpdateUserRole) -> AppResult<UserRole> {
        self.enter("update_user_role")?;
        let mut server = self.server();
        if server
            .roles
            .values()
            .any(|r| r.name == req.name && r.id != req.id)
        {
            return Err(AppError::from_server(400, codes::USER_ROLE_ALREADY_EXISTS));
        }
        let stored = server
            .roles
            .get_mut(&req.id)
            .ok_or_else(|| AppError::from_server(400, codes::USER_ROLE_NOT_FOUND))?;
        stored.name = req.name.trim().to_string();
        server.role_view(req.id)
    }

    async fn delete_user_role(&self, id: UserRoleId) -> AppResult<()> {
        self.enter("delete_user_role")?;
        let mut server = self.server();
        server
            .roles
            .remove(&id)
            .ok_or_else(|| AppError::from_server(400, codes::USER_ROLE_NOT_FOUND))?;
        server.access_roles.retain(|_, a| a.user_role_id != id);
        Ok(())
    }

    async fn add_access_role(&self, req: &CreateAccessRole) -> AppResult<AccessRole> {
        self.enter("add_access_role")?;
        let mut server = self.server();
        if !server.roles.contains_key(&req.user_role_id) {
            return Err(AppError::from_server(400, codes::USER_ROLE_NOT_FOUND));
        }
        if server
            .access_roles
            .values()
            .any(|a| a.user_role_id == req.user_role_id && a.folder_id == req.folder_id)
        {
            return Err(AppError::from_server(400, codes::ACCESS_ROLE_ALREADY_EXISTS));
        }
        let id = server.allocate();
        let created = access_role(
            id,
            req.user_role_id.get(),
            req.folder_id.get(),
            req.access_level,
        );
        server.access_roles.insert(created.id, created);
        Ok(created)
    }

    async fn remove_access_role(&self, id: AccessRoleId) -> AppResult<()> {
        self.enter("remove_access_role")?;
        self.server()
            .access_roles
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::from_server(400, codes::ACCESS_ROLE_NOT_FOUND))
    }
}
