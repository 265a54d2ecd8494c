//! Identity of cached records.

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// A record with a stable unique key.
///
/// The entity store indexes records by this key; two records with the same
/// key are the same entity.
pub trait Keyed {
    /// The key type.
    type Key: Copy + Ord + Hash + Debug + Display + Send + Sync + 'static;

    /// Return the record's key.
    fn key(&self) -> Self::Key;
}
