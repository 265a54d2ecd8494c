//! The process-wide cache object.
//!
//! [`CacheState`] is constructed once at startup and shared by `Arc`. It owns
//! every cached record, the recent-activity feed and the pending intent, and
//! it tears the whole cache down when the backend rejects the session.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, RwLock, Weak};

use async_trait::async_trait;
use tracing::{debug, warn};

use dochub_cache::{EntityStore, RequestStatus, SequenceTracker};
use dochub_core::{AppError, AppResult};
use dochub_core::config::tree::FeedConfig;
use dochub_core::types::{FileId, FolderId};
use dochub_entity::{File, Folder, PendingIntent, User, UserRole};

use crate::folder::feed::RecentFeed;

/// Which cache a request belongs to, for its loading/error indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Folders,
    Files,
    Users,
    UserRoles,
}

/// Ends the authenticated session when the cache detects it is invalid.
#[async_trait]
pub trait SessionGuard: Send + Sync {
    /// Drop the token and the persisted session. Must not call back into
    /// [`CacheState::teardown`].
    async fn invalidate(&self);
}

/// All cached client state.
pub struct CacheState {
    /// Folder records keyed by id.
    pub folders: EntityStore<Folder>,
    /// File records keyed by id.
    pub files: EntityStore<File>,
    /// User records keyed by id.
    pub users: EntityStore<User>,
    /// User-role records keyed by id.
    pub user_roles: EntityStore<UserRole>,
    pub(crate) folder_seq: SequenceTracker<FolderId>,
    pub(crate) file_seq: SequenceTracker<FileId>,
    feed: Mutex<RecentFeed>,
    intent: Mutex<PendingIntent>,
    users_loaded: AtomicBool,
    user_roles_loaded: AtomicBool,
    guard: RwLock<Option<Weak<dyn SessionGuard>>>,
}

impl std::fmt::Debug for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheState")
            .field("folders", &self.folders.len())
            .field("files", &self.files.len())
            .field("users", &self.users.len())
            .field("user_roles", &self.user_roles.len())
            .finish_non_exhaustive()
    }
}

impl CacheState {
    /// Create an empty cache.
    pub fn new(feed: &FeedConfig) -> Self {
        Self {
            folders: EntityStore::new(),
            files: EntityStore::new(),
            users: EntityStore::new(),
            user_roles: EntityStore::new(),
            folder_seq: SequenceTracker::new(),
            file_seq: SequenceTracker::new(),
            feed: Mutex::new(RecentFeed::new(feed)),
            intent: Mutex::new(PendingIntent::None),
            users_loaded: AtomicBool::new(false),
            user_roles_loaded: AtomicBool::new(false),
            guard: RwLock::new(None),
        }
    }

    /// Register the component that ends the session on teardown.
    pub fn set_session_guard(&self, guard: Weak<dyn SessionGuard>) {
        *self.guard.write().unwrap_or_else(|e| e.into_inner()) = Some(guard);
    }

    /// Loading/error indicators of a domain.
    pub fn status(&self, domain: Domain) -> &dyn RequestStatus {
        match domain {
            Domain::Folders => &self.folders,
            Domain::Files => &self.files,
            Domain::Users => &self.users,
            Domain::UserRoles => &self.user_roles,
        }
    }

    pub(crate) fn begin(&self, domain: Domain) {
        self.status(domain).begin_request();
    }

    pub(crate) fn finish(&self, domain: Domain) {
        self.status(domain).finish_request();
    }

    /// Record a failed request. An authentication failure tears the session
    /// down instead of being kept as the domain's error indicator.
    pub(crate) async fn fail(&self, domain: Domain, err: AppError) -> AppError {
        if err.invalidates_session() {
            warn!(?domain, code = err.code(), "Session rejected by backend");
            self.teardown().await;
        } else {
            debug!(?domain, code = err.code(), "Request failed");
            self.status(domain).fail_request(err.clone());
        }
        err
    }

    /// Run one request against `domain`, maintaining its indicators.
    pub(crate) async fn track<T>(
        &self,
        domain: Domain,
        request: impl Future<Output = AppResult<T>> + Send,
    ) -> AppResult<T> {
        self.begin(domain);
        match request.await {
            Ok(value) => {
                self.finish(domain);
                Ok(value)
            }
            Err(e) => Err(self.fail(domain, e).await),
        }
    }

    /// Record an error caught before any request was issued.
    pub(crate) fn reject(&self, domain: Domain, err: AppError) -> AppError {
        self.status(domain).set_error(err.clone());
        err
    }

    /// Drop every cached record, the feed, the pending intent and all
    /// indicators.
    pub fn clear_all(&self) {
        self.folders.remove_all();
        self.files.remove_all();
        self.users.remove_all();
        self.user_roles.remove_all();
        self.folder_seq.clear();
        self.file_seq.clear();
        self.feed().clear();
        *self.intent_slot() = PendingIntent::None;
        self.users_loaded.store(false, Ordering::Release);
        self.user_roles_loaded.store(false, Ordering::Release);
    }

    /// Clear all caches and end the session.
    pub async fn teardown(&self) {
        self.clear_all();
        let guard = self
            .guard
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(Weak::upgrade);
        if let Some(guard) = guard {
            guard.invalidate().await;
        }
    }

    pub(crate) fn feed(&self) -> MutexGuard<'_, RecentFeed> {
        self.feed.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn intent_slot(&self) -> MutexGuard<'_, PendingIntent> {
        self.intent.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The active intent.
    pub fn intent(&self) -> PendingIntent {
        *self.intent_slot()
    }

    /// Replace the active intent, returning the one it overwrote.
    pub fn set_intent(&self, intent: PendingIntent) -> PendingIntent {
        std::mem::replace(&mut *self.intent_slot(), intent)
    }

    /// Clear the active intent, returning it.
    pub fn cancel_intent(&self) -> PendingIntent {
        self.set_intent(PendingIntent::None)
    }

    /// Whether the full user list has been loaded.
    pub fn users_loaded(&self) -> bool {
        self.users_loaded.load(Ordering::Acquire)
    }

    pub(crate) fn mark_users_loaded(&self) {
        self.users_loaded.store(true, Ordering::Release);
    }

    /// Whether the full user-role list has been loaded.
    pub fn user_roles_loaded(&self) -> bool {
        self.user_roles_loaded.load(Ordering::Acquire)
    }

    pub(crate) fn mark_user_roles_loaded(&self) {
        self.user_roles_loaded.store(true, Ordering::Release);
    }
}
