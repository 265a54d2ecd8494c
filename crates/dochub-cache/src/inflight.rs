//! Coalescing of concurrent requests for the same id.
//!
//! The first caller to [`InFlight::claim`] a key becomes the leader and
//! performs the request. Callers arriving while the leader's
//! [`FlightGuard`] is alive become followers. The leader publishes its
//! result with [`FlightGuard::complete`]; every follower receives a clone.

use std::fmt::Debug;
use std::hash::Hash;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tracing::trace;

/// Registry of keys with an outstanding request producing a `V`.
#[derive(Debug)]
pub struct InFlight<K: Eq + Hash, V> {
    flights: DashMap<K, watch::Receiver<Option<V>>>,
}

/// Result of claiming a key.
#[derive(Debug)]
pub enum Claim<'a, K: Eq + Hash + Copy + Debug, V> {
    /// No request was outstanding; the caller must perform it.
    Leader(FlightGuard<'a, K, V>),
    /// A request is already outstanding; wait on it instead.
    Follower(Waiter<V>),
}

/// Held by the leader for the duration of its request.
#[derive(Debug)]
pub struct FlightGuard<'a, K: Eq + Hash + Copy + Debug, V> {
    registry: &'a InFlight<K, V>,
    key: K,
    done: Option<watch::Sender<Option<V>>>,
}

/// Handle a follower awaits.
#[derive(Debug)]
pub struct Waiter<V> {
    rx: watch::Receiver<Option<V>>,
}

impl<K: Eq + Hash + Copy + Debug, V> InFlight<K, V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            flights: DashMap::new(),
        }
    }

    /// Claim `key`, becoming its leader or a follower of the current leader.
    pub fn claim(&self, key: K) -> Claim<'_, K, V> {
        match self.flights.entry(key) {
            Entry::Occupied(entry) => {
                trace!(?key, "Joining in-flight request");
                Claim::Follower(Waiter {
                    rx: entry.get().clone(),
                })
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Claim::Leader(FlightGuard {
                    registry: self,
                    key,
                    done: Some(tx),
                })
            }
        }
    }

    /// Whether a request for `key` is outstanding.
    pub fn is_pending(&self, key: K) -> bool {
        self.flights.contains_key(&key)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    /// Whether no request is outstanding.
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

impl<K: Eq + Hash + Copy + Debug, V> Default for InFlight<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Copy + Debug, V> FlightGuard<'_, K, V> {
    /// The claimed key.
    pub fn key(&self) -> K {
        self.key
    }

    /// Publish the leader's result to every follower and release the key.
    pub fn complete(mut self, value: V) {
        if let Some(tx) = &self.done {
            tx.send_replace(Some(value));
        }
        self.release();
    }

    fn release(&mut self) {
        // Unregister before waking followers so they cannot re-join this flight.
        self.registry.flights.remove(&self.key);
        drop(self.done.take());
    }
}

impl<K: Eq + Hash + Copy + Debug, V> Drop for FlightGuard<'_, K, V> {
    fn drop(&mut self) {
        if self.done.is_some() {
            self.release();
        }
    }
}

impl<V: Clone> Waiter<V> {
    /// Wait for the leader's result. `None` when the leader was dropped
    /// without completing (its task was cancelled).
    pub async fn wait(mut self) -> Option<V> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        }
    }
}
