//! User records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dochub_core::error::codes;
use dochub_core::types::{UserId, UserRoleId};
use dochub_core::{AppError, AppResult};

use super::role::UserRole;
use crate::keyed::Keyed;

/// A user account. The backend never returns the password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Administrators may view every folder.
    #[serde(default)]
    pub is_admin: bool,
    /// First name.
    #[serde(default)]
    pub first_name: String,
    /// Last name.
    #[serde(default)]
    pub last_name: String,
    /// Roles assigned to this user.
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub user_roles: Vec<UserRole>,
    /// When the account was created.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name as "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Ids of the assigned roles.
    pub fn role_ids(&self) -> Vec<UserRoleId> {
        self.user_roles.iter().map(|r| r.id).collect()
    }

    /// Whether the user holds the given role.
    pub fn has_role(&self, id: UserRoleId) -> bool {
        self.user_roles.iter().any(|r| r.id == id)
    }
}

impl Keyed for User {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.id
    }
}

/// Body of `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl CreateUser {
    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_USERNAME));
        }
        if self.first_name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_FIRST_NAME));
        }
        if self.last_name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_LAST_NAME));
        }
        if self.password.is_empty() {
            return Err(AppError::validation(codes::REQUIRED_PASSWORD));
        }
        Ok(())
    }
}

/// Body of `PUT /users/{id}`. An absent password leaves it unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUser {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UpdateUser {
    /// Start an update that keeps every profile field of `user`.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
            password: None,
        }
    }

    /// Reject requests the backend would refuse, before any round trip.
    pub fn validate(&self) -> AppResult<()> {
        if self.id.is_unset() {
            return Err(AppError::validation(codes::REQUIRED_USER_ID));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_USERNAME));
        }
        if self.first_name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_FIRST_NAME));
        }
        if self.last_name.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_LAST_NAME));
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            return Err(AppError::validation(codes::REQUIRED_PASSWORD));
        }
        Ok(())
    }
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /login`; also the persisted session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// Profile of the authenticated user.
    pub user_data: User,
}
