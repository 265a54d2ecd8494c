//! Ancestor-path resolution and display truncation.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use dochub_cache::EntityStore;
use dochub_core::types::FolderId;
use dochub_core::{AppError, AppResult};
use dochub_entity::Folder;

use super::tree::TreeEngine;

/// Longest chain rendered in full.
const FULL_PATH_LIMIT: usize = 3;

/// Result of walking resident ancestors.
#[derive(Debug, Clone, PartialEq)]
pub enum Walk {
    /// Every ancestor is resident. Ordered leaf first, root last.
    Complete(Vec<Folder>),
    /// The walk stopped at a folder that is not resident.
    Missing(FolderId),
}

/// Walk `parent_folder_id` links from `id` up to the sentinel.
///
/// The walk is bounded by the number of resident folders; exceeding it means
/// the parent links form a cycle.
pub fn walk_ancestors(folders: &EntityStore<Folder>, id: FolderId) -> AppResult<Walk> {
    let limit = folders.len() + 1;
    let mut chain = Vec::new();
    let mut cursor = id;

    while !cursor.is_sentinel() {
        if chain.len() >= limit {
            return Err(AppError::integrity(format!(
                "folder {id} has a cyclic ancestor chain"
            )));
        }
        let Some(folder) = folders.get_by_id(cursor) else {
            return Ok(Walk::Missing(cursor));
        };
        cursor = folder.parent_folder_id;
        chain.push(folder);
    }

    Ok(Walk::Complete(chain))
}

/// One segment of a rendered path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crumb {
    Folder {
        id: FolderId,
        name: String,
        /// The folder the path was resolved for.
        current: bool,
    },
    Ellipsis,
}

impl fmt::Display for Crumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder { name, .. } => f.write_str(name),
            Self::Ellipsis => f.write_str("…"),
        }
    }
}

/// A display path, root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb(pub Vec<Crumb>);

impl Breadcrumb {
    /// Render a leaf-to-root chain. Chains longer than three folders keep the
    /// root and the two folders nearest the leaf.
    pub fn render(chain: &[Folder]) -> Self {
        let crumb = |folder: &Folder, current: bool| Crumb::Folder {
            id: folder.id,
            name: folder.name.clone(),
            current,
        };

        let mut root_first: Vec<&Folder> = chain.iter().rev().collect();
        let Some(leaf) = root_first.pop() else {
            return Self(Vec::new());
        };

        let mut crumbs = Vec::with_capacity(FULL_PATH_LIMIT + 1);
        if chain.len() > FULL_PATH_LIMIT {
            crumbs.push(crumb(root_first[0], false));
            crumbs.push(Crumb::Ellipsis);
            crumbs.push(crumb(root_first[root_first.len() - 1], false));
        } else {
            crumbs.extend(root_first.iter().map(|f| crumb(f, false)));
        }
        crumbs.push(crumb(leaf, true));
        Self(crumbs)
    }

    /// The segments, root first.
    pub fn crumbs(&self) -> &[Crumb] {
        &self.0
    }
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, crumb) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{crumb}")?;
        }
        Ok(())
    }
}

/// Resolves breadcrumbs, fetching missing ancestors through the tree engine.
#[derive(Debug, Clone)]
pub struct BreadcrumbResolver {
    engine: Arc<TreeEngine>,
    max_rounds: u32,
}

impl BreadcrumbResolver {
    /// Creates a new resolver allowing at most `max_rounds` ancestor fetches.
    pub fn new(engine: Arc<TreeEngine>, max_rounds: u32) -> Self {
        Self { engine, max_rounds }
    }

    /// The full leaf-to-root chain of `id`.
    pub async fn chain(&self, id: FolderId) -> AppResult<Vec<Folder>> {
        let folders = &self.engine.state().folders;
        for round in 0..=self.max_rounds {
            match walk_ancestors(folders, id)? {
                Walk::Complete(chain) => return Ok(chain),
                Walk::Missing(missing) if round < self.max_rounds => {
                    debug!(folder_id = %id, missing = %missing, round, "Fetching missing ancestor");
                    self.engine.fetch_folder(missing).await?;
                }
                Walk::Missing(_) => break,
            }
        }
        Err(AppError::integrity(format!(
            "ancestors of folder {id} unresolved after {} fetches",
            self.max_rounds
        )))
    }

    /// The rendered path to `id`.
    pub async fn resolve(&self, id: FolderId) -> AppResult<Breadcrumb> {
        let chain = self.chain(id).await?;
        Ok(Breadcrumb::render(&chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dochub_core::config::tree::{FeedConfig, PrefetchConfig};

    use crate::state::CacheState;
    use crate::testing::{FakeDocumentApi, folder};

    fn names(breadcrumb: &Breadcrumb) -> Vec<String> {
        breadcrumb.crumbs().iter().map(|c| c.to_string()).collect()
    }

    /// Leaf-to-root chain of `depth` folders: ids depth..=1.
    fn chain(depth: u32) -> Vec<Folder> {
        (1..=depth)
            .rev()
            .map(|id| folder(id, &format!("f{id}"), id - 1))
            .collect()
    }

    #[test]
    fn test_chain_of_three_renders_in_full() {
        let rendered = Breadcrumb::render(&chain(3));
        assert_eq!(names(&rendered), vec!["f1", "f2", "f3"]);
        assert_eq!(rendered.to_string(), "f1 / f2 / f3");
    }

    #[test]
    fn test_chain_of_four_is_truncated() {
        let rendered = Breadcrumb::render(&chain(4));
        assert_eq!(names(&rendered), vec!["f1", "…", "f3", "f4"]);
    }

    #[test]
    fn test_long_chain_keeps_root_and_two_nearest() {
        let rendered = Breadcrumb::render(&chain(7));
        assert_eq!(names(&rendered), vec!["f1", "…", "f6", "f7"]);
        assert!(matches!(
            rendered.crumbs().last(),
            Some(Crumb::Folder { current: true, .. })
        ));
    }

    #[test]
    fn test_single_folder_and_empty_chain() {
        assert_eq!(names(&Breadcrumb::render(&chain(1))), vec!["f1"]);
        assert!(Breadcrumb::render(&[]).crumbs().is_empty());
    }

    #[test]
    fn test_walk_reports_first_missing_ancestor() {
        let store = EntityStore::new();
        store.upsert_one(folder(3, "c", 2));
        assert_eq!(
            walk_ancestors(&store, FolderId::new(3)).unwrap(),
            Walk::Missing(FolderId::new(2))
        );

        store.upsert_one(folder(2, "b", 1));
        store.upsert_one(folder(1, "a", 0));
        let Walk::Complete(chain) = walk_ancestors(&store, FolderId::new(3)).unwrap() else {
            panic!("expected a complete walk");
        };
        let ids: Vec<u32> = chain.iter().map(|f| f.id.get()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_cycle_is_an_integrity_error() {
        let store = EntityStore::new();
        store.upsert_one(folder(2, "b", 3));
        store.upsert_one(folder(3, "c", 2));
        let err = walk_ancestors(&store, FolderId::new(3)).unwrap_err();
        assert_eq!(err.kind, dochub_core::ErrorKind::Integrity);
    }

    #[tokio::test]
    async fn test_resolver_fetches_missing_ancestors() {
        let api = Arc::new(FakeDocumentApi::new());
        for id in 1..=5 {
            api.seed_folder(folder(id, &format!("f{id}"), id - 1));
        }
        let engine = Arc::new(TreeEngine::new(
            api.clone(),
            Arc::new(CacheState::new(&FeedConfig::default())),
            PrefetchConfig {
                ancestor_depth: 0,
                descendant_depth: 0,
                max_children: 0,
            },
        ));
        engine.fetch_folder(FolderId::new(5)).await.unwrap();
        assert!(!engine.state().folders.contains(FolderId::new(4)));

        let resolver = BreadcrumbResolver::new(engine.clone(), 16);
        let path = resolver.resolve(FolderId::new(5)).await.unwrap();
        assert_eq!(path.to_string(), "f1 / … / f4 / f5");

        let chain = resolver.chain(FolderId::new(5)).await.unwrap();
        assert_eq!(chain.last().map(|f| f.id), Some(FolderId::ROOT));
        assert_eq!(api.folder_fetches(FolderId::new(4)), 1);
    }

    #[tokio::test]
    async fn test_resolver_gives_up_after_max_rounds() {
        let api = Arc::new(FakeDocumentApi::new());
        for id in 1..=4 {
            api.seed_folder(folder(id, &format!("f{id}"), id - 1));
        }
        let engine = Arc::new(TreeEngine::new(
            api,
            Arc::new(CacheState::new(&FeedConfig::default())),
            PrefetchConfig {
                ancestor_depth: 0,
                descendant_depth: 0,
                max_children: 0,
            },
        ));
        let resolver = BreadcrumbResolver::new(engine, 2);
        let err = resolver.resolve(FolderId::new(4)).await.unwrap_err();
        assert_eq!(err.kind, dochub_core::ErrorKind::Integrity);
    }
}
