//! In-memory [`StorageEngine`] implementation backed by [`DashMap`].
//!
//! Provides concurrent read/write access without external locking.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tablegate_core::Item;

use crate::storage::engine::{ItemUpdater, StorageEngine};
use crate::traits::BackendError;

/// In-memory storage backed by [`DashMap`] for concurrent access.
///
/// Readers never block each other; writers lock only the shard holding
/// their key.
pub struct HashMapStorage {
    entries: DashMap<String, Item>,
}

impl HashMapStorage {
    /// Creates a new, empty `HashMapStorage`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for HashMapStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for HashMapStorage {
    fn get(&self, key: &str) -> Option<Item> {
        self.entries.get(key).map(|r| r.clone())
    }

    fn remove(&self, key: &str) -> Option<Item> {
        self.entries.remove(key).map(|(_, item)| item)
    }

    fn upsert_with(&self, key: &str, updater: &mut ItemUpdater<'_>) -> Result<(), BackendError> {
        // The entry guard holds the shard lock for the whole read-modify-write.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let next = updater(Some(occupied.get()))?;
                occupied.insert(next);
            }
            Entry::Vacant(vacant) => {
                let next = updater(None)?;
                vacant.insert(next);
            }
        }
        Ok(())
    }

    fn snapshot_iter(&self) -> Vec<(String, Item)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}
