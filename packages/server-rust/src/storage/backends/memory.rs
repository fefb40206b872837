//! In-memory [`KeyValueBackend`].
//!
//! [`InMemoryBackend`] keeps a catalog of tables, each backed by its own
//! [`HashMapStorage`] engine. Data lives for the lifetime of the process,
//! which for a function runtime means one warm container.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tablegate_core::{
    AttributeUpdate, GetItemOutput, Item, Key, ScanOutput, TableSchema, WriteOutput,
};
use tracing::debug;

use crate::storage::engine::StorageEngine;
use crate::storage::engines::HashMapStorage;
use crate::storage::key::{encode_key, key_of_item};
use crate::storage::update::apply_updates;
use crate::traits::{BackendError, KeyValueBackend};

/// One declared table: its schema and the engine holding its items.
struct MemoryTable {
    schema: TableSchema,
    engine: Box<dyn StorageEngine>,
}

/// Process-local key-value backend.
pub struct InMemoryBackend {
    tables: DashMap<String, Arc<MemoryTable>>,
}

impl InMemoryBackend {
    /// Creates a backend with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
        }
    }

    /// Creates a backend and declares `schemas`.
    ///
    /// # Errors
    ///
    /// Returns `TableExists` if `schemas` names the same table twice.
    pub fn with_tables(
        schemas: impl IntoIterator<Item = TableSchema>,
    ) -> Result<Self, BackendError> {
        let backend = Self::new();
        for schema in schemas {
            backend.insert_table(schema)?;
        }
        Ok(backend)
    }

    fn insert_table(&self, schema: TableSchema) -> Result<(), BackendError> {
        match self.tables.entry(schema.name.clone()) {
            Entry::Occupied(_) => Err(BackendError::TableExists { table: schema.name }),
            Entry::Vacant(vacant) => {
                debug!(table = %schema.name, "declared in-memory table");
                vacant.insert(Arc::new(MemoryTable {
                    schema,
                    engine: Box::new(HashMapStorage::new()),
                }));
                Ok(())
            }
        }
    }

    /// Clones the table handle out of the catalog so no catalog lock is held
    /// while the engine is used.
    fn table(&self, name: &str) -> Result<Arc<MemoryTable>, BackendError> {
        self.tables
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| BackendError::table_not_found(name))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueBackend for InMemoryBackend {
    async fn create_table(&self, schema: TableSchema) -> Result<(), BackendError> {
        self.insert_table(schema)
    }

    async fn table_schema(&self, table: &str) -> Result<TableSchema, BackendError> {
        Ok(self.table(table)?.schema.clone())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<WriteOutput, BackendError> {
        let table = self.table(table)?;
        let key = encode_key(
            &table.schema.key_schema,
            &key_of_item(&table.schema.key_schema, &item)?,
        )?;
        let mut item = Some(item);
        table.engine.upsert_with(&key, &mut |_| {
            item.take()
                .ok_or_else(|| BackendError::Internal(anyhow::anyhow!("updater called twice")))
        })?;
        Ok(WriteOutput {})
    }

    async fn get_item(&self, table: &str, key: &Key) -> Result<GetItemOutput, BackendError> {
        let table = self.table(table)?;
        let key = encode_key(&table.schema.key_schema, key)?;
        Ok(GetItemOutput {
            item: table.engine.get(&key),
        })
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        updates: &BTreeMap<String, AttributeUpdate>,
    ) -> Result<WriteOutput, BackendError> {
        let table = self.table(table)?;
        let schema = &table.schema.key_schema;
        let encoded = encode_key(schema, key)?;
        table.engine.upsert_with(&encoded, &mut |previous| {
            apply_updates(schema, key, previous.cloned(), updates)
        })?;
        Ok(WriteOutput {})
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<WriteOutput, BackendError> {
        let table = self.table(table)?;
        let key = encode_key(&table.schema.key_schema, key)?;
        table.engine.remove(&key);
        Ok(WriteOutput {})
    }

    async fn scan(&self, table: &str) -> Result<ScanOutput, BackendError> {
        let table = self.table(table)?;
        let items = table
            .engine
            .snapshot_iter()
            .into_iter()
            .map(|(_, item)| item)
            .collect();
        Ok(ScanOutput::from_items(items))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tablegate_core::KeySchema;

    use super::*;

    fn obj(v: Value) -> Item {
        match v {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn backend() -> InMemoryBackend {
        InMemoryBackend::with_tables([TableSchema::new("t", KeySchema::new("id"))]).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_returns_item() {
        let backend = backend();
        backend
            .put_item("t", obj(json!({"id": "a", "n": 1})))
            .await
            .unwrap();

        let out = backend.get_item("t", &obj(json!({"id": "a"}))).await.unwrap();
        assert_eq!(out.item, Some(obj(json!({"id": "a", "n": 1}))));
    }

    #[tokio::test]
    async fn put_overwrites_same_key() {
        let backend = backend();
        backend.put_item("t", obj(json!({"id": "a", "n": 1}))).await.unwrap();
        backend.put_item("t", obj(json!({"id": "a", "m": 2}))).await.unwrap();

        let out = backend.get_item("t", &obj(json!({"id": "a"}))).await.unwrap();
        assert_eq!(out.item, Some(obj(json!({"id": "a", "m": 2}))));
        assert_eq!(backend.scan("t").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn missing_item_reads_as_empty() {
        let backend = backend();
        let out = backend.get_item("t", &obj(json!({"id": "nope"}))).await.unwrap();
        assert_eq!(out, GetItemOutput::default());
    }

    #[tokio::test]
    async fn update_upserts_and_merges() {
        let backend = backend();
        let key = obj(json!({"id": "a"}));
        let updates: BTreeMap<String, AttributeUpdate> =
            serde_json::from_value(json!({"n": {"Value": 1}})).unwrap();
        backend.update_item("t", &key, &updates).await.unwrap();

        let add: BTreeMap<String, AttributeUpdate> =
            serde_json::from_value(json!({"n": {"Action": "ADD", "Value": 4}})).unwrap();
        backend.update_item("t", &key, &add).await.unwrap();

        let out = backend.get_item("t", &key).await.unwrap();
        assert_eq!(out.item, Some(obj(json!({"id": "a", "n": 5}))));
    }

    #[tokio::test]
    async fn failed_update_does_not_create_item() {
        let backend = backend();
        let key = obj(json!({"id": "a"}));
        let bad: BTreeMap<String, AttributeUpdate> =
            serde_json::from_value(json!({"n": {"Action": "PUT"}})).unwrap();
        assert!(backend.update_item("t", &key, &bad).await.is_err());
        assert_eq!(backend.scan("t").await.unwrap().count, 0);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = backend();
        backend.put_item("t", obj(json!({"id": "a"}))).await.unwrap();
        let key = obj(json!({"id": "a"}));
        backend.delete_item("t", &key).await.unwrap();
        backend.delete_item("t", &key).await.unwrap();
        assert_eq!(backend.get_item("t", &key).await.unwrap().item, None);
    }

    #[tokio::test]
    async fn unknown_table_is_reported() {
        let backend = backend();
        let err = backend.scan("missing").await.unwrap_err();
        assert!(matches!(err, BackendError::TableNotFound { table } if table == "missing"));
    }

    #[tokio::test]
    async fn duplicate_table_is_rejected() {
        let backend = backend();
        let err = backend
            .create_table(TableSchema::new("t", KeySchema::new("other")))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::TableExists { .. }));
        assert_eq!(
            backend.table_schema("t").await.unwrap().key_schema,
            KeySchema::new("id")
        );
    }

    #[tokio::test]
    async fn item_without_key_is_rejected() {
        let backend = backend();
        let err = backend.put_item("t", obj(json!({"n": 1}))).await.unwrap_err();
        assert!(matches!(err, BackendError::Validation { .. }));
    }
}
