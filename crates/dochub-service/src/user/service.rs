//! User administration backed by the user cache.

use std::sync::Arc;

use tracing::info;

use dochub_core::AppResult;
use dochub_core::types::UserId;
use dochub_entity::{CreateUser, UpdateUser, User, UserRole};

use crate::api::DocumentApi;
use crate::state::{CacheState, Domain};

/// Reads and edits users, keeping the cached records current.
#[derive(Clone)]
pub struct UserService {
    api: Arc<dyn DocumentApi>,
    state: Arc<CacheState>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish()
    }
}

impl UserService {
    /// Creates a new user service.
    pub fn new(api: Arc<dyn DocumentApi>, state: Arc<CacheState>) -> Self {
        Self { api, state }
    }

    /// Fetch every user and replace the cached list.
    pub async fn load_all(&self) -> AppResult<Vec<User>> {
        let users = self
            .state
            .track(Domain::Users, self.api.get_users())
            .await?;
        self.state.users.remove_all();
        let count = self.state.users.upsert_many(users);
        self.state.mark_users_loaded();
        info!(count, "Loaded users");
        Ok(self.state.users.all())
    }

    /// Cached users, loading them on first use.
    pub async fn list(&self) -> AppResult<Vec<User>> {
        if self.state.users_loaded() {
            return Ok(self.state.users.all());
        }
        self.load_all().await
    }

    /// A user, from cache when resident.
    pub async fn get(&self, id: UserId) -> AppResult<User> {
        if let Some(user) = self.state.users.get_by_id(id) {
            return Ok(user);
        }
        let user = self
            .state
            .track(Domain::Users, self.api.get_user(id))
            .await?;
        self.state.users.upsert_one(user.clone());
        Ok(user)
    }

    /// Create a user.
    pub async fn create(&self, req: CreateUser) -> AppResult<User> {
        if let Err(e) = req.validate() {
            return Err(self.state.reject(Domain::Users, e));
        }
        let user = self
            .state
            .track(Domain::Users, self.api.create_user(&req))
            .await?;
        self.state.users.upsert_one(user.clone());
        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Update a user's profile and optionally their password.
    pub async fn update(&self, req: UpdateUser) -> AppResult<User> {
        if let Err(e) = req.validate() {
            return Err(self.state.reject(Domain::Users, e));
        }
        let user = self
            .state
            .track(Domain::Users, self.api.update_user(&req))
            .await?;
        self.state.users.upsert_one(user.clone());
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    /// Delete a user.
    pub async fn delete(&self, id: UserId) -> AppResult<()> {
        self.state
            .track(Domain::Users, self.api.delete_user(id))
            .await?;
        self.state.users.remove_one(id);
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Assign a role to a user.
    pub async fn add_role(&self, user_id: UserId, role: &UserRole) -> AppResult<User> {
        let user = self
            .state
            .track(Domain::Users, self.api.add_user_role(user_id, &role.to_ref()))
            .await?;
        self.state.users.upsert_one(user.clone());
        info!(user_id = %user_id, role_id = %role.id, "Role assigned");
        Ok(user)
    }

    /// Withdraw a role from a user.
    pub async fn remove_role(&self, user_id: UserId, role: &UserRole) -> AppResult<User> {
        let user = self
            .state
            .track(
                Domain::Users,
                self.api.remove_user_role(user_id, &role.to_ref()),
            )
            .await?;
        self.state.users.upsert_one(user.clone());
        info!(user_id = %user_id, role_id = %role.id, "Role withdrawn");
        Ok(user)
    }
}
