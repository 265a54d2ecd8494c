//! Session lifecycle manager: login, restore, profile update and logout.
//!
//! The manager is also the cache's [`SessionGuard`]: when any cached domain
//! sees an authentication failure, the cache clears itself and asks the
//! manager to drop the token and the persisted session.

use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;
use tracing::{info, warn};

use dochub_core::error::codes;
use dochub_core::{AppError, AppResult};
use dochub_entity::{LoginRequest, LoginResponse, User};
use dochub_service::{CacheState, DocumentApi, SessionGuard};

use super::store::SessionStore;

/// Owns the bearer token and the signed-in user's profile.
pub struct SessionManager {
    /// Transport receiving the bearer token.
    api: Arc<dyn DocumentApi>,
    /// Shared cache, cleared on logout.
    state: Arc<CacheState>,
    /// Durable copy of the session.
    store: SessionStore,
    /// The active session, if any.
    current: RwLock<Option<LoginResponse>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("store", &self.store)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionManager {
    /// Creates a session manager and registers it as the cache's session
    /// guard.
    pub fn new(
        api: Arc<dyn DocumentApi>,
        state: Arc<CacheState>,
        store: SessionStore,
    ) -> Arc<Self> {
        let manager = Arc::new(Self {
            api,
            state,
            store,
            current: RwLock::new(None),
        });
        let guard: Weak<dyn SessionGuard> = Arc::downgrade(&manager) as Weak<dyn SessionGuard>;
        manager.state.set_session_guard(guard);
        manager
    }

    /// Authenticate and persist the session.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<User> {
        if username.trim().is_empty() {
            return Err(AppError::validation(codes::REQUIRED_USERNAME));
        }
        if password.is_empty() {
            return Err(AppError::validation(codes::REQUIRED_PASSWORD));
        }

        let req = LoginRequest {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let session = match self.api.login(&req).await {
            Ok(session) => session,
            Err(e) => {
                warn!(username = %req.username, code = e.code(), "Login failed");
                return Err(e);
            }
        };

        self.store.save(&session).await?;
        let user = self.install(session);
        info!(user_id = %user.id, username = %user.username, "Logged in");
        Ok(user)
    }

    /// Reload a persisted session, if one exists.
    pub async fn restore(&self) -> AppResult<Option<User>> {
        let Some(session) = self.store.load().await? else {
            return Ok(None);
        };
        let user = self.install(session);
        info!(user_id = %user.id, "Session restored");
        Ok(Some(user))
    }

    /// Replace the signed-in user's profile, in memory and on disk.
    pub async fn update_profile(&self, user: User) -> AppResult<()> {
        let session = {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            let Some(session) = current.as_mut() else {
                return Err(AppError::unauthorized());
            };
            session.user_data = user.clone();
            session.clone()
        };
        self.store.save(&session).await?;
        self.state.users.upsert_one(user);
        Ok(())
    }

    /// End the session and clear every cache.
    pub async fn logout(&self) -> AppResult<()> {
        let user = self.current_user();
        self.state.clear_all();
        self.end_session().await?;
        info!(user_id = ?user.map(|u| u.id), "Logged out");
        Ok(())
    }

    /// The signed-in user's profile.
    pub fn current_user(&self) -> Option<User> {
        self.read().as_ref().map(|s| s.user_data.clone())
    }

    /// The active bearer token.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.token.clone())
    }

    /// Whether a session is active.
    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<LoginResponse>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn install(&self, session: LoginResponse) -> User {
        self.api.set_token(Some(session.token.clone()));
        let user = session.user_data.clone();
        self.state.users.upsert_one(user.clone());
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(session);
        user
    }

    async fn end_session(&self) -> AppResult<()> {
        self.api.set_token(None);
        self.current
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        self.store.clear().await
    }
}

#[async_trait]
impl SessionGuard for SessionManager {
    async fn invalidate(&self) {
        warn!("Session invalidated by backend");
        if let Err(e) = self.end_session().await {
            warn!(error = %e, "Failed to remove persisted session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dochub_core::config::tree::{FeedConfig, PrefetchConfig};
    use dochub_core::types::{FolderId, UserId};
    use dochub_service::TreeEngine;
    use dochub_service::testing::{FakeDocumentApi, folder, user};

    struct Fixture {
        _dir: tempfile::TempDir,
        api: Arc<FakeDocumentApi>,
        state: Arc<CacheState>,
        sessions: Arc<SessionManager>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let api = Arc::new(FakeDocumentApi::new());
        api.seed_user(user(5, "dana", false), "hunter2");
        api.seed_folder(folder(1, "root", 0));
        let state = Arc::new(CacheState::new(&FeedConfig::default()));
        let sessions = SessionManager::new(
            api.clone(),
            state.clone(),
            SessionStore::at(dir.path().join("session.json")),
        );
        Fixture {
            _dir: dir,
            api,
            state,
            sessions,
        }
    }

    #[tokio::test]
    async fn test_login_installs_token_and_persists() {
        let fx = fixture();
        let user = fx.sessions.login("dana", "hunter2").await.unwrap();

        assert_eq!(user.id, UserId::new(5));
        assert_eq!(fx.api.token().as_deref(), Some("token-5"));
        assert!(fx.state.users.contains(UserId::new(5)));
        let persisted = fx.sessions.store.load().await.unwrap().unwrap();
        assert_eq!(persisted.token, "token-5");
    }

    #[tokio::test]
    async fn test_bad_password_keeps_signed_out() {
        let fx = fixture();
        let err = fx.sessions.login("dana", "nope").await.unwrap_err();
        assert_eq!(err.code(), codes::INCORRECT_PASSWORD);
        assert!(!fx.sessions.is_authenticated());
        assert!(fx.api.token().is_none());
    }

    #[tokio::test]
    async fn test_empty_credentials_are_rejected_locally() {
        let fx = fixture();
        let err = fx.sessions.login(" ", "x").await.unwrap_err();
        assert_eq!(err.code(), codes::REQUIRED_USERNAME);
        assert_eq!(fx.api.calls("login"), 0);
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_session() {
        let fx = fixture();
        fx.sessions.login("dana", "hunter2").await.unwrap();

        let state = Arc::new(CacheState::new(&FeedConfig::default()));
        let api = Arc::new(FakeDocumentApi::new());
        let restored = SessionManager::new(api.clone(), state, fx.sessions.store.clone());
        let user = restored.restore().await.unwrap().unwrap();
        assert_eq!(user.username, "dana");
        assert_eq!(api.token().as_deref(), Some("token-5"));
    }

    #[tokio::test]
    async fn test_update_profile_requires_session() {
        let fx = fixture();
        let err = fx
            .sessions
            .update_profile(user(5, "dana", false))
            .await
            .unwrap_err();
        assert!(err.invalidates_session());

        fx.sessions.login("dana", "hunter2").await.unwrap();
        let mut profile = fx.sessions.current_user().unwrap();
        profile.first_name = "Dana".to_string();
        fx.sessions.update_profile(profile).await.unwrap();
        let persisted = fx.sessions.store.load().await.unwrap().unwrap();
        assert_eq!(persisted.user_data.first_name, "Dana");
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let fx = fixture();
        fx.sessions.login("dana", "hunter2").await.unwrap();
        fx.state.folders.upsert_one(folder(1, "root", 0));

        fx.sessions.logout().await.unwrap();

        assert!(!fx.sessions.is_authenticated());
        assert!(fx.api.token().is_none());
        assert!(fx.state.folders.is_empty());
        assert!(fx.state.users.is_empty());
        assert!(!fx.sessions.store.path().exists());
    }

    #[tokio::test]
    async fn test_unauthorized_response_ends_session() {
        let fx = fixture();
        fx.sessions.login("dana", "hunter2").await.unwrap();
        let engine = TreeEngine::new(
            fx.api.clone(),
            fx.state.clone(),
            PrefetchConfig::default(),
        );

        fx.api.fail_next("get_folder", AppError::unauthorized());
        let err = engine.fetch_folder(FolderId::ROOT).await.unwrap_err();

        assert!(err.invalidates_session());
        assert!(!fx.sessions.is_authenticated());
        assert!(fx.api.token().is_none());
        assert!(fx.state.users.is_empty());
        assert!(!fx.sessions.store.path().exists());
    }
}
