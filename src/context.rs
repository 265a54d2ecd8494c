//! Wiring of transport, caches and services for one CLI invocation.

use std::sync::Arc;

use dochub_auth::{AccessResolver, SessionManager, SessionStore};
use dochub_client::HttpDocumentApi;
use dochub_core::config::AppConfig;
use dochub_core::{AppError, AppResult};
use dochub_entity::User;
use dochub_service::{
    BreadcrumbResolver, CacheState, DocumentApi, FileService, TreeEngine, UserRoleService,
    UserService,
};

/// Everything a command needs, built once at startup.
pub struct Context {
    pub config: AppConfig,
    pub state: Arc<CacheState>,
    pub engine: Arc<TreeEngine>,
    pub files: FileService,
    pub users: UserService,
    pub roles: UserRoleService,
    pub breadcrumbs: BreadcrumbResolver,
    pub access: AccessResolver,
    pub sessions: Arc<SessionManager>,
}

impl Context {
    /// Build the context over the HTTP transport and restore any persisted
    /// session.
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        let api: Arc<dyn DocumentApi> = Arc::new(HttpDocumentApi::new(&config.client)?);
        let context = Self::with_api(config, api);
        if let Some(user) = context.sessions.restore().await? {
            tracing::debug!(user_id = %user.id, "Using persisted session");
        }
        Ok(context)
    }

    /// Build the context over any transport.
    pub fn with_api(config: AppConfig, api: Arc<dyn DocumentApi>) -> Self {
        let state = Arc::new(CacheState::new(&config.feed));
        let engine = Arc::new(TreeEngine::new(
            api.clone(),
            state.clone(),
            config.prefetch.clone(),
        ));
        let breadcrumbs =
            BreadcrumbResolver::new(engine.clone(), config.breadcrumb.max_fetch_rounds);
        let sessions = SessionManager::new(
            api.clone(),
            state.clone(),
            SessionStore::new(&config.session),
        );

        Self {
            files: FileService::new(engine.clone()),
            users: UserService::new(api.clone(), state.clone()),
            roles: UserRoleService::new(api, state.clone()),
            access: AccessResolver::new(breadcrumbs.clone(), state.clone()),
            breadcrumbs,
            engine,
            sessions,
            state,
            config,
        }
    }

    /// The signed-in user, or an authentication error.
    pub fn require_user(&self) -> AppResult<User> {
        self.sessions
            .current_user()
            .ok_or_else(AppError::unauthorized)
    }
}
