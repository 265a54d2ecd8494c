//! Tree consistency engine.
//!
//! Fetches folders on demand, prefetches their neighbours within configured
//! bounds, and applies create/update/delete responses so that every parent's
//! `child_folders`/`files` arrays agree with the flat stores.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, join_all};
use tracing::{debug, info, warn};

use dochub_cache::{Claim, InFlight};
use dochub_core::config::tree::PrefetchConfig;
use dochub_core::error::codes;
use dochub_core::types::{FileId, FolderId};
use dochub_core::{AppError, AppResult};
use dochub_entity::{
    AccessLevel, CreateFolder, EntryRef, File, Folder, FolderSummary, RecentUpdate, UpdateFolder,
};

use crate::api::DocumentApi;
use crate::state::{CacheState, Domain};

/// How a fetch request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Already resident; no request was made.
    Cached,
    /// Fetched and applied.
    Fetched,
    /// Another caller's outstanding request satisfied this one.
    Coalesced,
    /// Fetched, but a newer response had already been applied.
    Stale,
}

/// Remaining prefetch depth for one step of the fan-out.
#[derive(Debug, Clone, Copy)]
struct Budget {
    ancestors: u32,
    descendants: u32,
}

/// A folder's contents sorted for display.
#[derive(Debug, Clone)]
pub struct Listing {
    pub folder: Folder,
    pub folders: Vec<FolderSummary>,
    pub files: Vec<File>,
}

/// A feed entry resolved against the stores.
#[derive(Debug, Clone)]
pub struct RecentEntry {
    pub entry: EntryRef,
    pub name: String,
    /// The folder itself, or the folder containing the file.
    pub location: FolderId,
    pub updated_at: chrono::DateTime<Utc>,
}

/// Keeps the cached folder hierarchy navigable and free of duplicates.
pub struct TreeEngine {
    pub(crate) api: Arc<dyn DocumentApi>,
    pub(crate) state: Arc<CacheState>,
    inflight: InFlight<FolderId, AppResult<FetchOutcome>>,
    prefetch: PrefetchConfig,
}

impl std::fmt::Debug for TreeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeEngine")
            .field("in_flight", &self.inflight.len())
            .field("prefetch", &self.prefetch)
            .finish_non_exhaustive()
    }
}

impl TreeEngine {
    /// Creates a new tree engine.
    pub fn new(
        api: Arc<dyn DocumentApi>,
        state: Arc<CacheState>,
        prefetch: PrefetchConfig,
    ) -> Self {
        Self {
            api,
            state,
            inflight: InFlight::new(),
            prefetch,
        }
    }

    /// The shared cache.
    pub fn state(&self) -> &Arc<CacheState> {
        &self.state
    }

    /// Ensure a folder is resident, fetching it and its neighbours if not.
    pub async fn fetch_folder(&self, id: FolderId) -> AppResult<FetchOutcome> {
        if id.is_sentinel() {
            return Err(self
                .state
                .reject(Domain::Folders, AppError::validation(codes::REQUIRED_FOLDER_ID)));
        }
        let budget = Budget {
            ancestors: self.prefetch.ancestor_depth,
            descendants: self.prefetch.descendant_depth,
        };
        self.ensure(id, budget).await
    }

    /// Fetch a folder even if it is resident, then prefetch as usual.
    pub async fn refresh_folder(&self, id: FolderId) -> AppResult<FetchOutcome> {
        let budget = Budget {
            ancestors: self.prefetch.ancestor_depth,
            descendants: self.prefetch.descendant_depth,
        };
        loop {
            match self.inflight.claim(id) {
                Claim::Follower(waiter) => {
                    if let Some(result) = waiter.wait().await {
                        return result;
                    }
                }
                Claim::Leader(guard) => {
                    let loaded = self.load(id, budget).await;
                    guard.complete(for_followers(&loaded));
                    return self.finish_load(loaded).await;
                }
            }
        }
    }

    fn ensure(&self, id: FolderId, budget: Budget) -> BoxFuture<'_, AppResult<FetchOutcome>> {
        async move {
            if self.state.folders.contains(id) {
                return Ok(FetchOutcome::Cached);
            }

            loop {
                let guard = match self.inflight.claim(id) {
                    Claim::Leader(guard) => guard,
                    Claim::Follower(waiter) => match waiter.wait().await {
                        Some(result) => return result,
                        None if self.state.folders.contains(id) => {
                            return Ok(FetchOutcome::Coalesced);
                        }
                        // The leader was cancelled; try again.
                        None => continue,
                    },
                };

                // The previous leader may have finished between the check and the claim.
                if self.state.folders.contains(id) {
                    guard.complete(Ok(FetchOutcome::Coalesced));
                    return Ok(FetchOutcome::Cached);
                }

                let loaded = self.load(id, budget).await;
                guard.complete(for_followers(&loaded));
                return self.finish_load(loaded).await;
            }
        }
        .boxed()
    }

    /// Issue the request and apply the response. Runs while the caller holds
    /// the in-flight claim for `id`.
    async fn load(&self, id: FolderId, budget: Budget) -> AppResult<Loaded> {
        let seq = self.state.folder_seq.issue();
        self.state.begin(Domain::Folders);
        debug!(folder_id = %id, seq, "Fetching folder");

        let folder = match self.api.get_folder(id).await {
            Ok(folder) => folder,
            Err(e) => return Err(self.state.fail(Domain::Folders, e).await),
        };

        let parent = folder.parent_folder_id;
        let children: Vec<FolderId> = folder.child_folders.iter().map(|c| c.id).collect();
        let applied = self.apply_fetched(folder, seq);
        self.state.finish(Domain::Folders);

        Ok(Loaded {
            applied,
            parent,
            children,
            budget,
        })
    }

    async fn finish_load(&self, loaded: AppResult<Loaded>) -> AppResult<FetchOutcome> {
        let loaded = loaded?;
        if !loaded.applied {
            return Ok(FetchOutcome::Stale);
        }
        self.fan_out(loaded.parent, &loaded.children, loaded.budget)
            .await;
        Ok(FetchOutcome::Fetched)
    }

    /// Ensure the parent (upwards) and children (downwards) of a freshly
    /// fetched folder. Failures here never fail the primary fetch.
    async fn fan_out(&self, parent: FolderId, children: &[FolderId], budget: Budget) {
        let mut tasks = Vec::new();

        if !parent.is_sentinel() && budget.ancestors > 0 {
            tasks.push(self.ensure(
                parent,
                Budget {
                    ancestors: budget.ancestors - 1,
                    descendants: 0,
                },
            ));
        }

        if budget.descendants > 0 {
            for &child in children.iter().take(self.prefetch.max_children) {
                tasks.push(self.ensure(
                    child,
                    Budget {
                        ancestors: 0,
                        descendants: budget.descendants - 1,
                    },
                ));
            }
        }

        for result in join_all(tasks).await {
            if let Err(e) = result {
                warn!(code = e.code(), "Prefetch failed");
            }
        }
    }

    /// Upsert a fetched folder and reconcile it with the flat stores.
    fn apply_fetched(&self, mut folder: Folder, seq: dochub_cache::Seq) -> bool {
        if !self.state.folder_seq.try_apply(folder.id, seq) {
            warn!(folder_id = %folder.id, seq, "Discarding stale folder response");
            return false;
        }

        // Child summaries vs. resident child records: newer side wins.
        for summary in &mut folder.child_folders {
            let Some(mut resident) = self.state.folders.get_by_id(summary.id) else {
                continue;
            };
            if resident.updated_at > summary.updated_at {
                *summary = resident.summary();
            } else if resident.summary() != *summary {
                resident.name = summary.name.clone();
                resident.parent_folder_id = summary.parent_folder_id;
                resident.last_editor_id = summary.last_editor_id;
                resident.updated_at = summary.updated_at;
                self.state.folders.upsert_one(resident);
            }
        }

        // Embedded files vs. flat file records: newer side wins.
        let mut fresh_files = Vec::with_capacity(folder.files.len());
        for file in &mut folder.files {
            match self.state.files.get_by_id(file.id) {
                Some(resident) if resident.updated_at > file.updated_at => {
                    *file = resident;
                }
                _ => fresh_files.push(file.clone()),
            }
        }

        // Files cached under this folder that the backend no longer lists.
        let listed: BTreeSet<FileId> = folder.files.iter().map(|f| f.id).collect();
        let vanished: Vec<FileId> = self
            .state
            .files
            .filter(|f| f.folder_id == folder.id && !listed.contains(&f.id))
            .into_iter()
            .map(|f| f.id)
            .collect();

        let now = Utc::now();
        {
            let mut feed = self.state.feed();
            feed.observe(RecentUpdate::from(&folder), now);
            for file in &folder.files {
                feed.observe(RecentUpdate::from(file), now);
            }
        }

        if folder.access_level == AccessLevel::Unset {
            if let Some(resident) = self.state.folders.get_by_id(folder.id) {
                folder.access_level = resident.access_level;
            }
        }
        let summary = folder.summary();
        self.state.folders.upsert_one(folder);
        self.state.files.upsert_many(fresh_files.iter().cloned());
        self.state.files.remove_many(vanished);
        for file in &fresh_files {
            self.place_file(file);
        }
        self.place_child_summary(summary);
        true
    }

    /// Put a folder's summary into its resident parent (replacing in place or
    /// appending) and out of any other resident folder that still lists it.
    pub(crate) fn place_child_summary(&self, summary: FolderSummary) {
        let id = summary.id;
        let parent = summary.parent_folder_id;

        let stale_parents = self
            .state
            .folders
            .filter(|f| f.id != parent && f.child(id).is_some());
        for mut old in stale_parents {
            old.child_folders.retain(|c| c.id != id);
            self.state.folders.upsert_one(old);
        }

        if let Some(mut parent_folder) = self.state.folders.get_by_id(parent) {
            match parent_folder.child_folders.iter_mut().find(|c| c.id == id) {
                Some(slot) if *slot == summary => return,
                Some(slot) => *slot = summary,
                None => parent_folder.child_folders.push(summary),
            }
            self.state.folders.upsert_one(parent_folder);
        }
    }

    /// Put a file into its resident folder's `files` (replacing in place or
    /// appending) and out of any other resident folder that still lists it.
    pub(crate) fn place_file(&self, file: &File) {
        let stale_folders = self
            .state
            .folders
            .filter(|f| f.id != file.folder_id && f.file(file.id).is_some());
        for mut old in stale_folders {
            old.files.retain(|f| f.id != file.id);
            self.state.folders.upsert_one(old);
        }

        if let Some(mut folder) = self.state.folders.get_by_id(file.folder_id) {
            match folder.files.iter_mut().find(|f| f.id == file.id) {
                Some(slot) if slot == file => return,
                Some(slot) => *slot = file.clone(),
                None => folder.files.push(file.clone()),
            }
            self.state.folders.upsert_one(folder);
        }
    }

    /// Take a deleted file out of `folder_id` (and any other resident folder
    /// still listing it), the file store and the feed.
    pub(crate) fn detach_file(&self, folder_id: FolderId, id: FileId) {
        let listing = self
            .state
            .folders
            .filter(|f| f.id == folder_id || f.file(id).is_some());
        for mut folder in listing {
            let before = folder.files.len();
            folder.files.retain(|f| f.id != id);
            if folder.files.len() != before {
                self.state.folders.upsert_one(folder);
            }
        }
        self.state.files.remove_one(id);
        self.state.file_seq.forget(id);
        self.state.feed().remove(EntryRef::File(id));
    }

    /// Create a sub-folder. The parent must be resident.
    pub async fn create_folder(&self, req: CreateFolder) -> AppResult<Folder> {
        if let Err(e) = req.validate() {
            return Err(self.state.reject(Domain::Folders, e));
        }
        if !self.state.folders.contains(req.parent_folder_id) {
            return Err(self.state.reject(
                Domain::Folders,
                AppError::validation(codes::INVALID_PARENT_FOLDER_ID),
            ));
        }

        let req = CreateFolder {
            name: req.name.trim().to_string(),
            ..req
        };
        self.state.begin(Domain::Folders);
        let created = match self.api.create_folder(&req).await {
            Ok(folder) => folder,
            Err(e) => return Err(self.state.fail(Domain::Folders, e).await),
        };

        let seq = self.state.folder_seq.issue();
        self.state.folder_seq.try_apply(created.id, seq);
        self.state.folders.upsert_one(created.clone());
        self.place_child_summary(created.summary());
        self.state
            .feed()
            .observe(RecentUpdate::from(&created), Utc::now());
        self.state.cancel_intent();
        self.state.finish(Domain::Folders);

        info!(folder_id = %created.id, parent = %created.parent_folder_id, "Folder created");
        Ok(created)
    }

    /// Rename and/or move a folder.
    pub async fn update_folder(&self, req: UpdateFolder) -> AppResult<Folder> {
        if let Err(e) = req.validate() {
            return Err(self.state.reject(Domain::Folders, e));
        }
        let current = self.state.folders.get_by_id(req.id);
        if let Some(current) = &current {
            if current.name == req.name.trim() && current.parent_folder_id == req.parent_folder_id
            {
                return Err(self
                    .state
                    .reject(Domain::Folders, AppError::validation(codes::NAME_UNCHANGED)));
            }
        }

        let req = UpdateFolder {
            name: req.name.trim().to_string(),
            ..req
        };
        let seq = self.state.folder_seq.issue();
        self.state.begin(Domain::Folders);
        let mut updated = match self.api.update_folder(&req).await {
            Ok(folder) => folder,
            Err(e) => return Err(self.state.fail(Domain::Folders, e).await),
        };

        if !self.state.folder_seq.try_apply(updated.id, seq) {
            warn!(folder_id = %updated.id, seq, "Discarding stale folder update");
            self.state.cancel_intent();
            self.state.finish(Domain::Folders);
            return Ok(self.state.folders.get_by_id(updated.id).unwrap_or(updated));
        }

        // The update response is authoritative for the folder's own fields
        // only; keep the contents we already know about.
        if let Some(resident) = self.state.folders.get_by_id(updated.id) {
            updated.child_folders = resident.child_folders;
            updated.files = resident.files;
            updated.access_level = resident.access_level;
        }
        self.state.folders.upsert_one(updated.clone());
        self.place_child_summary(updated.summary());
        self.state
            .feed()
            .observe(RecentUpdate::from(&updated), Utc::now());
        self.state.cancel_intent();
        self.state.finish(Domain::Folders);

        info!(folder_id = %updated.id, parent = %updated.parent_folder_id, "Folder updated");
        Ok(updated)
    }

    /// Delete a folder. `parent` is the folder whose `child_folders` must
    /// lose the entry; it is not re-derived from cached state.
    pub async fn delete_folder(&self, id: FolderId, parent: FolderId) -> AppResult<()> {
        if id.is_sentinel() {
            return Err(self
                .state
                .reject(Domain::Folders, AppError::validation(codes::REQUIRED_FOLDER_ID)));
        }

        self.state.begin(Domain::Folders);
        if let Err(e) = self.api.delete_folder(id).await {
            return Err(self.state.fail(Domain::Folders, e).await);
        }

        if let Some(mut parent_folder) = self.state.folders.get_by_id(parent) {
            parent_folder.child_folders.retain(|c| c.id != id);
            self.state.folders.upsert_one(parent_folder);
        }
        let evicted = self.evict_subtree(id);
        self.state.cancel_intent();
        self.state.finish(Domain::Folders);

        info!(folder_id = %id, parent = %parent, evicted, "Folder deleted");
        Ok(())
    }

    /// Remove a folder and every resident descendant folder and file.
    fn evict_subtree(&self, root: FolderId) -> usize {
        let mut doomed = BTreeSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if !doomed.insert(id) {
                continue;
            }
            if let Some(folder) = self.state.folders.get_by_id(id) {
                queue.extend(folder.child_folders.iter().map(|c| c.id));
            }
            queue.extend(
                self.state
                    .folders
                    .filter(|f| f.parent_folder_id == id)
                    .into_iter()
                    .map(|f| f.id),
            );
        }

        let files = self
            .state
            .files
            .filter(|f| doomed.contains(&f.folder_id));
        let removed = self.state.folders.remove_many(doomed.iter().copied());

        let mut feed = self.state.feed();
        for id in &doomed {
            feed.remove(EntryRef::Folder(*id));
            self.state.folder_seq.forget(*id);
        }
        for file in &files {
            feed.remove(EntryRef::File(file.id));
            self.state.file_seq.forget(file.id);
        }
        drop(feed);
        self.state.files.remove_many(files.iter().map(|f| f.id));

        removed.len() + files.len()
    }

    /// A resident folder's children and files, each sorted by name.
    pub fn listing(&self, id: FolderId) -> Option<Listing> {
        let folder = self.state.folders.get_by_id(id)?;
        let mut folders = folder.child_folders.clone();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        let mut files = folder.files.clone();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Some(Listing {
            folder,
            folders,
            files,
        })
    }

    /// Fetch a folder if needed and return its sorted listing.
    pub async fn open(&self, id: FolderId) -> AppResult<Listing> {
        self.fetch_folder(id).await?;
        self.listing(id)
            .ok_or_else(|| AppError::not_found(codes::FOLDER_NOT_FOUND))
    }

    /// The recent-activity feed resolved to names, newest first. Entries
    /// whose record is no longer resident are skipped.
    pub fn recent_activity(&self) -> Vec<RecentEntry> {
        let updates = self.state.feed().entries(Utc::now());
        updates
            .into_iter()
            .filter_map(|u| match u.entry {
                EntryRef::Folder(id) => self.state.folders.get_by_id(id).map(|f| RecentEntry {
                    entry: u.entry,
                    name: f.name,
                    location: f.id,
                    updated_at: u.updated_at,
                }),
                EntryRef::File(id) => self.state.files.get_by_id(id).map(|f| RecentEntry {
                    entry: u.entry,
                    name: f.name,
                    location: f.folder_id,
                    updated_at: u.updated_at,
                }),
            })
            .collect()
    }
}

/// What a follower of the leader's request receives: the leader's error
/// verbatim, or `Coalesced` once the response has been applied.
fn for_followers(loaded: &AppResult<Loaded>) -> AppResult<FetchOutcome> {
    match loaded {
        Ok(_) => Ok(FetchOutcome::Coalesced),
        Err(e) => Err(e.clone()),
    }
}

/// Result of a leader's request, carried out of the in-flight claim.
#[derive(Debug)]
struct Loaded {
    applied: bool,
    parent: FolderId,
    children: Vec<FolderId>,
    budget: Budget,
}
