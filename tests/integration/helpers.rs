//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use dochub_auth::{AccessResolver, SessionManager, SessionStore};
use dochub_core::config::AppConfig;
use dochub_entity::AccessLevel;
use dochub_service::testing::{FakeDocumentApi, access_role, file, folder, user, user_role};
use dochub_service::{
    BreadcrumbResolver, CacheState, FileService, TreeEngine, UserRoleService, UserService,
};

pub const STAFF: u32 = 7;
pub const EDITORS: u32 = 8;

/// A fully wired client over an in-memory backend.
///
/// Seeded tree:
///
/// ```text
/// root(1) ── projects(2) ── alpha(3) ── specs(4)
///        │                          └── plan.txt(21)
///        ├── archive(5)
///        └── readme.md(20)
/// ```
///
/// `admin` (1) is an administrator; `jdoe` (2) holds the `staff` role, which
/// the root's baseline binding makes Viewer everywhere.
pub struct TestApp {
    pub api: Arc<FakeDocumentApi>,
    pub state: Arc<CacheState>,
    pub engine: Arc<TreeEngine>,
    pub files: FileService,
    pub users: UserService,
    pub roles: UserRoleService,
    pub breadcrumbs: BreadcrumbResolver,
    pub access: AccessResolver,
    pub sessions: Arc<SessionManager>,
    pub session_store: SessionStore,
    _dir: TempDir,
}

impl TestApp {
    /// Create a new test application with the seeded backend
    pub fn new() -> Self {
        let api = Arc::new(FakeDocumentApi::new());
        api.seed_folder(folder(1, "root", 0));
        api.seed_folder(folder(2, "projects", 1));
        api.seed_folder(folder(3, "alpha", 2));
        api.seed_folder(folder(4, "specs", 3));
        api.seed_folder(folder(5, "archive", 1));
        api.seed_file(file(20, "readme.md", 1));
        api.seed_file(file(21, "plan.txt", 3));

        api.seed_user_role(user_role(STAFF, "staff"));
        api.seed_user_role(user_role(EDITORS, "editors"));
        api.seed_access_role(access_role(1, STAFF, 1, AccessLevel::Viewer));

        api.seed_user(user(1, "admin", true), "admin");
        let mut jdoe = user(2, "jdoe", false);
        jdoe.user_roles.push(user_role(STAFF, "staff"));
        api.seed_user(jdoe, "secret");

        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::at(dir.path().join("session.json"));
        Self::with_backend(api, store, dir)
    }

    /// A second client sharing this one's backend and session file
    pub fn restart(&self) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        Self::with_backend(self.api.clone(), self.session_store.clone(), dir)
    }

    fn with_backend(api: Arc<FakeDocumentApi>, session_store: SessionStore, dir: TempDir) -> Self {
        let config = AppConfig::default();
        let state = Arc::new(CacheState::new(&config.feed));
        let engine = Arc::new(TreeEngine::new(
            api.clone(),
            state.clone(),
            config.prefetch.clone(),
        ));
        let breadcrumbs =
            BreadcrumbResolver::new(engine.clone(), config.breadcrumb.max_fetch_rounds);
        let sessions = SessionManager::new(api.clone(), state.clone(), session_store.clone());

        Self {
            files: FileService::new(engine.clone()),
            users: UserService::new(api.clone(), state.clone()),
            roles: UserRoleService::new(api.clone(), state.clone()),
            access: AccessResolver::new(breadcrumbs.clone(), state.clone()),
            breadcrumbs,
            engine,
            sessions,
            session_store,
            state,
            api,
            _dir: dir,
        }
    }

    /// Log in as a seeded user
    pub async fn login(&self, username: &str, password: &str) -> dochub_entity::User {
        self.sessions
            .login(username, password)
            .await
            .expect("login failed")
    }
}
