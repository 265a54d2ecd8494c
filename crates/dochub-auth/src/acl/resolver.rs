//! Effective access-level resolver.
//!
//! Resolution walks the folder's ancestor chain, leaf first. At each folder
//! the role's explicit binding, if any, decides the level; nothing is summed
//! or maxed along the chain. No binding anywhere up to the root yields
//! [`AccessLevel::Unset`].
//!
//! For a user, every role is resolved that way and the most privileged
//! result wins, with a floor of `None` (or `Viewer` for administrators).

use std::sync::Arc;

use tracing::debug;

use dochub_core::AppResult;
use dochub_core::types::{FolderId, UserRoleId};
use dochub_entity::{AccessLevel, Folder, User, UserRole};
use dochub_service::{BreadcrumbResolver, CacheState};

/// The level `role_id` holds on the first folder of `chain` (leaf-to-root)
/// that carries an explicit binding for it.
///
/// Bindings are looked up on the folder's own `access_roles` first and then
/// on the role record, since either side may be the one that is resident.
pub fn nearest_binding(
    chain: &[Folder],
    role_id: UserRoleId,
    role: Option<&UserRole>,
) -> AccessLevel {
    for folder in chain {
        let on_folder = folder
            .access_roles
            .iter()
            .find(|a| a.user_role_id == role_id);
        let on_role = role.and_then(|r| r.binding_for(folder.id));
        if let Some(binding) = on_folder.or(on_role) {
            return binding.access_level;
        }
    }
    AccessLevel::Unset
}

/// Resolves effective access levels against the folder cache, fetching
/// missing ancestors through the breadcrumb resolver.
#[derive(Clone)]
pub struct AccessResolver {
    /// Ancestor chain resolution.
    chains: BreadcrumbResolver,
    /// Shared cache for role and folder records.
    state: Arc<CacheState>,
}

impl std::fmt::Debug for AccessResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessResolver").finish()
    }
}

impl AccessResolver {
    /// Creates a new access resolver.
    pub fn new(chains: BreadcrumbResolver, state: Arc<CacheState>) -> Self {
        Self { chains, state }
    }

    /// Effective level of one role on a folder.
    pub async fn resolve(
        &self,
        role_id: UserRoleId,
        folder_id: FolderId,
    ) -> AppResult<AccessLevel> {
        let chain = self.chains.chain(folder_id).await?;
        let role = self.state.user_roles.get_by_id(role_id);
        let level = nearest_binding(&chain, role_id, role.as_ref());
        debug!(role_id = %role_id, folder_id = %folder_id, %level, "Resolved access level");
        Ok(level)
    }

    /// Effective level of a user on a folder across all of their roles.
    pub async fn resolve_for_user(
        &self,
        user: &User,
        folder_id: FolderId,
    ) -> AppResult<AccessLevel> {
        let chain = self.chains.chain(folder_id).await?;
        let floor = if user.is_admin {
            AccessLevel::Viewer
        } else {
            AccessLevel::None
        };

        let level = user
            .user_roles
            .iter()
            .map(|embedded| {
                let cached = self.state.user_roles.get_by_id(embedded.id);
                nearest_binding(&chain, embedded.id, Some(cached.as_ref().unwrap_or(embedded)))
            })
            .fold(floor, AccessLevel::max);

        debug!(user_id = %user.id, folder_id = %folder_id, %level, "Resolved user access level");
        Ok(level)
    }

    /// Resolve a user's level on a folder and record it on the cached folder.
    pub async fn annotate(&self, user: &User, folder_id: FolderId) -> AppResult<AccessLevel> {
        let level = self.resolve_for_user(user, folder_id).await?;
        if let Some(mut folder) = self.state.folders.get_by_id(folder_id) {
            if folder.access_level != level {
                folder.access_level = level;
                self.state.folders.upsert_one(folder);
            }
        }
        Ok(level)
    }
}
