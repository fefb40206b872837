use std::collections::BTreeMap;

use async_trait::async_trait;
use tablegate_core::{
    AttributeUpdate, GetItemOutput, Item, Key, ScanOutput, TableSchema, WriteOutput,
};

/// Failures reported by a [`KeyValueBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("table not found: {table}")]
    TableNotFound { table: String },
    #[error("table already exists: {table}")]
    TableExists { table: String },
    /// The key, item or update does not fit the table's schema.
    #[error("validation failed: {reason}")]
    Validation { reason: String },
    /// Storage-level failure (I/O, corruption, serialization).
    #[error("backend failure: {0}")]
    Internal(#[from] anyhow::Error),
}

impl BackendError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn table_not_found(table: &str) -> Self {
        Self::TableNotFound {
            table: table.to_string(),
        }
    }
}

/// Key-value storage consumed by the operation router.
///
/// Implementations: in-memory (`DashMap`), `redb` (durable, feature-gated).
/// Every method addresses a table by name; tables must be created first.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Declare a table. Fails with `TableExists` if the name is taken.
    async fn create_table(&self, schema: TableSchema) -> Result<(), BackendError>;

    /// Look up the schema of a declared table.
    async fn table_schema(&self, table: &str) -> Result<TableSchema, BackendError>;

    /// Insert an item, replacing any item with the same key.
    async fn put_item(&self, table: &str, item: Item) -> Result<WriteOutput, BackendError>;

    /// Fetch one item. A missing item is an empty output, not an error.
    async fn get_item(&self, table: &str, key: &Key) -> Result<GetItemOutput, BackendError>;

    /// Apply attribute updates, creating the item from its key if absent.
    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        updates: &BTreeMap<String, AttributeUpdate>,
    ) -> Result<WriteOutput, BackendError>;

    /// Remove one item. Removing a missing item succeeds.
    async fn delete_item(&self, table: &str, key: &Key) -> Result<WriteOutput, BackendError>;

    /// Return every item in the table, in backend order.
    async fn scan(&self, table: &str) -> Result<ScanOutput, BackendError>;
}
