//! User roles and their folder access bindings.

use std::sync::Arc;

use tracing::info;

use dochub_core::error::codes;
use dochub_core::types::UserRoleId;
use dochub_core::{AppError, AppResult};
use dochub_entity::{AccessRole, CreateAccessRole, CreateUserRole, UpdateUserRole, UserRole};

use crate::api::DocumentApi;
use crate::state::{CacheState, Domain};

/// Reads and edits user roles and the access roles they hold.
#[derive(Clone)]
pub struct UserRoleService {
    api: Arc<dyn DocumentApi>,
    state: Arc<CacheState>,
}

impl std::fmt::Debug for UserRoleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRoleService").finish()
    }
}

impl UserRoleService {
    /// Creates a new user-role service.
    pub fn new(api: Arc<dyn DocumentApi>, state: Arc<CacheState>) -> Self {
        Self { api, state }
    }

    /// Fetch every role and replace the cached list.
    pub async fn load_all(&self) -> AppResult<Vec<UserRole>> {
        let roles = self
            .state
            .track(Domain::UserRoles, self.api.get_user_roles())
            .await?;
        self.state.user_roles.remove_all();
        let count = self.state.user_roles.upsert_many(roles);
        self.state.mark_user_roles_loaded();
        info!(count, "Loaded user roles");
        Ok(self.state.user_roles.all())
    }

    /// Cached roles, loading them on first use.
    pub async fn list(&self) -> AppResult<Vec<UserRole>> {
        if self.state.user_roles_loaded() {
            return Ok(self.state.user_roles.all());
        }
        self.load_all().await
    }

    /// A role, from cache when resident.
    pub async fn get(&self, id: UserRoleId) -> AppResult<UserRole> {
        if let Some(role) = self.state.user_roles.get_by_id(id) {
            return Ok(role);
        }
        let role = self
            .state
            .track(Domain::UserRoles, self.api.get_user_role(id))
            .await?;
        self.state.user_roles.upsert_one(role.clone());
        Ok(role)
    }

    /// Create a role.
    pub async fn create(&self, req: CreateUserRole) -> AppResult<UserRole> {
        if let Err(e) = req.validate() {
            return Err(self.state.reject(Domain::UserRoles, e));
        }
        let req = CreateUserRole {
            name: req.name.trim().to_string(),
        };
        let role = self
            .state
            .track(Domain::UserRoles, self.api.create_user_role(&req))
            .await?;
        self.state.user_roles.upsert_one(role.clone());
        info!(role_id = %role.id, name = %role.name, "User role created");
        Ok(role)
    }

    /// Rename a role. Renaming to the current name is rejected.
    pub async fn update(&self, req: UpdateUserRole) -> AppResult<UserRole> {
        let current = self.state.user_roles.get_by_id(req.id);
        if let Err(e) = req.validate_against(current.as_ref()) {
            return Err(self.state.reject(Domain::UserRoles, e));
        }
        let req = UpdateUserRole {
            name: req.name.trim().to_string(),
            ..req
        };
        let role = self
            .state
            .track(Domain::UserRoles, self.api.update_user_role(&req))
            .await?;
        self.state.user_roles.upsert_one(role.clone());
        info!(role_id = %role.id, name = %role.name, "User role renamed");
        Ok(role)
    }

    /// Delete a role. Cached users lose it and cached folders lose its
    /// bindings.
    pub async fn delete(&self, id: UserRoleId) -> AppResult<()> {
        self.state
            .track(Domain::UserRoles, self.api.delete_user_role(id))
            .await?;
        self.state.user_roles.remove_one(id);

        for mut user in self.state.users.filter(|u| u.has_role(id)) {
            user.user_roles.retain(|r| r.id != id);
            self.state.users.upsert_one(user);
        }
        let bound = self
            .state
            .folders
            .filter(|f| f.access_roles.iter().any(|a| a.user_role_id == id));
        for mut folder in bound {
            folder.access_roles.retain(|a| a.user_role_id != id);
            self.state.folders.upsert_one(folder);
        }

        info!(role_id = %id, "User role deleted");
        Ok(())
    }

    /// Bind a role to a folder at an access level.
    pub async fn add_access_role(&self, req: CreateAccessRole) -> AppResult<AccessRole> {
        if let Err(e) = req.validate() {
            return Err(self.state.reject(Domain::UserRoles, e));
        }
        let binding = self
            .state
            .track(Domain::UserRoles, self.api.add_access_role(&req))
            .await?;

        if let Some(mut role) = self.state.user_roles.get_by_id(binding.user_role_id) {
            if !role.access_roles.iter().any(|a| a.id == binding.id) {
                role.access_roles.push(binding);
                self.state.user_roles.upsert_one(role);
            }
        }
        if let Some(mut folder) = self.state.folders.get_by_id(binding.folder_id) {
            if !folder.access_roles.iter().any(|a| a.id == binding.id) {
                folder.access_roles.push(binding);
                self.state.folders.upsert_one(folder);
            }
        }

        info!(
            access_role_id = %binding.id,
            role_id = %binding.user_role_id,
            folder_id = %binding.folder_id,
            level = %binding.access_level,
            "Access role added"
        );
        Ok(binding)
    }

    /// Remove a binding. The root folder's baseline binding is protected.
    pub async fn remove_access_role(&self, binding: &AccessRole) -> AppResult<()> {
        if binding.is_root_default() {
            return Err(self.state.reject(
                Domain::UserRoles,
                AppError::validation(codes::ROOT_ACCESS_ROLE_PROTECTED),
            ));
        }
        self.state
            .track(Domain::UserRoles, self.api.remove_access_role(binding.id))
            .await?;

        if let Some(mut role) = self.state.user_roles.get_by_id(binding.user_role_id) {
            role.access_roles.retain(|a| a.id != binding.id);
            self.state.user_roles.upsert_one(role);
        }
        if let Some(mut folder) = self.state.folders.get_by_id(binding.folder_id) {
            folder.access_roles.retain(|a| a.id != binding.id);
            self.state.folders.upsert_one(folder);
        }

        info!(access_role_id = %binding.id, "Access role removed");
        Ok(())
    }
}
