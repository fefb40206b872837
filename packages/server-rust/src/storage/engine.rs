//! Low-level storage engine trait.
//!
//! Defines [`StorageEngine`], the per-table key-value map the in-memory
//! backend is built from. Keys are canonical key encodings
//! (see [`encode_key`](super::key::encode_key)).

use tablegate_core::Item;

use crate::traits::BackendError;

/// Closure computing the new item for a key from its current item.
pub type ItemUpdater<'a> = dyn FnMut(Option<&Item>) -> Result<Item, BackendError> + 'a;

/// In-memory key-value storage for one table.
///
/// All operations are synchronous. Wrapped in `Box<dyn StorageEngine>` so
/// tables can be shared across async boundaries behind an `Arc`.
pub trait StorageEngine: Send + Sync + 'static {
    /// Retrieve an item by key, or `None` if not present.
    fn get(&self, key: &str) -> Option<Item>;

    /// Remove an item by key, returning the removed item.
    fn remove(&self, key: &str) -> Option<Item>;

    /// Atomically replace the item under `key` with the output of `updater`.
    ///
    /// No other write to `key` can interleave between the read and the write.
    /// If `updater` fails, the stored item is left untouched.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `updater`.
    fn upsert_with(&self, key: &str, updater: &mut ItemUpdater<'_>) -> Result<(), BackendError>;

    /// Return a point-in-time snapshot of all entries.
    ///
    /// The snapshot is mutation-tolerant (concurrent modifications do not fail).
    fn snapshot_iter(&self) -> Vec<(String, Item)>;
}
