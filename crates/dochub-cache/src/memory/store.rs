//! Normalized keyed record store.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use dochub_core::AppError;
use dochub_entity::Keyed;

/// A keyed collection of records plus the loading/error indicators of the
/// requests that feed it.
///
/// Every method takes the lock exactly once, so readers never observe a
/// half-applied call. Upsert replaces the whole record: callers that want to
/// keep fields the server did not send must copy them over first.
#[derive(Debug)]
pub struct EntityStore<T: Keyed> {
    inner: RwLock<StoreInner<T>>,
}

#[derive(Debug)]
struct StoreInner<T: Keyed> {
    records: BTreeMap<T::Key, T>,
    loading: usize,
    error: Option<AppError>,
}

impl<T: Keyed + Clone> EntityStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: BTreeMap::new(),
                loading: 0,
                error: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner<T>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner<T>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace a record, returning the previous one.
    pub fn upsert_one(&self, record: T) -> Option<T> {
        let key = record.key();
        self.write().records.insert(key, record)
    }

    /// Insert or replace several records under one lock.
    pub fn upsert_many<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut inner = self.write();
        let mut count = 0;
        for record in records {
            inner.records.insert(record.key(), record);
            count += 1;
        }
        count
    }

    /// Remove a record by key.
    pub fn remove_one(&self, key: T::Key) -> Option<T> {
        self.write().records.remove(&key)
    }

    /// Remove several records under one lock, returning those that existed.
    pub fn remove_many<I>(&self, keys: I) -> Vec<T>
    where
        I: IntoIterator<Item = T::Key>,
    {
        let mut inner = self.write();
        keys.into_iter()
            .filter_map(|k| inner.records.remove(&k))
            .collect()
    }

    /// Remove every record and reset the loading/error indicators.
    pub fn remove_all(&self) {
        let mut inner = self.write();
        let dropped = inner.records.len();
        inner.records.clear();
        inner.loading = 0;
        inner.error = None;
        debug!(dropped, "Entity store cleared");
    }

    /// Get a copy of a record.
    pub fn get_by_id(&self, key: T::Key) -> Option<T> {
        self.read().records.get(&key).cloned()
    }

    /// Whether a record is resident.
    pub fn contains(&self, key: T::Key) -> bool {
        self.read().records.contains_key(&key)
    }

    /// Keys in default order: most recently created (highest key) first.
    pub fn ids(&self) -> Vec<T::Key> {
        self.read().records.keys().rev().copied().collect()
    }

    /// Copies of all records in default order.
    pub fn all(&self) -> Vec<T> {
        self.read().records.values().rev().cloned().collect()
    }

    /// Copies of records matching `pred`, in default order.
    pub fn filter<F>(&self, mut pred: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        self.read()
            .records
            .values()
            .rev()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    /// Number of resident records.
    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    /// Mark a request as started and clear the previous error.
    pub fn begin_request(&self) {
        let mut inner = self.write();
        inner.loading += 1;
        inner.error = None;
    }

    /// Mark a request as finished successfully.
    pub fn finish_request(&self) {
        let mut inner = self.write();
        inner.loading = inner.loading.saturating_sub(1);
    }

    /// Mark a request as failed and record its error.
    pub fn fail_request(&self, error: AppError) {
        let mut inner = self.write();
        inner.loading = inner.loading.saturating_sub(1);
        inner.error = Some(error);
    }

    /// Record an error without touching the loading count.
    pub fn set_error(&self, error: AppError) {
        self.write().error = Some(error);
    }

    /// The last recorded error.
    pub fn error(&self) -> Option<AppError> {
        self.read().error.clone()
    }

    /// Whether any request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.read().loading > 0
    }
}

/// Loading/error indicators of a store, independent of its record type.
pub trait RequestStatus: Send + Sync {
    /// Mark a request as started and clear the previous error.
    fn begin_request(&self);
    /// Mark a request as finished successfully.
    fn finish_request(&self);
    /// Mark a request as failed and record its error.
    fn fail_request(&self, error: AppError);
    /// Record an error without touching the loading count.
    fn set_error(&self, error: AppError);
    /// The last recorded error.
    fn error(&self) -> Option<AppError>;
    /// Whether any request is outstanding.
    fn is_loading(&self) -> bool;
}

impl<T: Keyed + Clone + Send + Sync> RequestStatus for EntityStore<T> {
    fn begin_request(&self) {
        EntityStore::begin_request(self)
    }

    fn finish_request(&self) {
        EntityStore::finish_request(self)
    }

    fn fail_request(&self, error: AppError) {
        EntityStore::fail_request(self, error)
    }

    fn set_error(&self, error: AppError) {
        EntityStore::set_error(self, error)
    }

    fn error(&self) -> Option<AppError> {
        EntityStore::error(self)
    }

    fn is_loading(&self) -> bool {
        EntityStore::is_loading(self)
    }
}

impl<T: Keyed + Clone> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
