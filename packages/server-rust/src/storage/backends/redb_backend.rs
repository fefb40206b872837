//! Durable [`KeyValueBackend`] on top of the `redb` embedded database.
//!
//! Each logical table maps to one redb table named `items:<table>`, holding
//! items as JSON text under their canonical key encoding. Table schemas are
//! persisted in a catalog table so a reopened database keeps its key schemas.
//!
//! redb is synchronous; every call runs on the blocking thread pool.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use dashmap::DashMap;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use tablegate_core::{
    AttributeUpdate, GetItemOutput, Item, Key, ScanOutput, TableSchema, WriteOutput,
};
use tracing::{debug, info};

use crate::storage::key::{encode_key, key_of_item};
use crate::storage::update::apply_updates;
use crate::traits::{BackendError, KeyValueBackend};

const CATALOG: TableDefinition<&str, &str> = TableDefinition::new("tablegate:catalog");

fn items_table_name(table: &str) -> String {
    format!("items:{table}")
}

fn items_def(name: &str) -> TableDefinition<'_, &'static str, &'static str> {
    TableDefinition::new(name)
}

fn decode_item(json: &str) -> Result<Item, BackendError> {
    Ok(serde_json::from_str(json).context("stored item is not a JSON object")?)
}

fn encode_item(item: &Item) -> Result<String, BackendError> {
    Ok(serde_json::to_string(item).context("failed to serialize item")?)
}

/// `redb`-backed persistent backend.
pub struct RedbBackend {
    db: Arc<Database>,
    schemas: DashMap<String, TableSchema>,
}

impl RedbBackend {
    /// Opens (or creates) the database file at `path` and loads its catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the catalog is corrupt.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path)
            .with_context(|| format!("failed to open redb database at {}", path.display()))?;

        // Make sure the catalog exists so later read transactions can open it.
        let txn = db.begin_write()?;
        txn.open_table(CATALOG)?;
        txn.commit()?;

        let schemas = DashMap::new();
        {
            let txn = db.begin_read()?;
            let catalog = txn.open_table(CATALOG)?;
            for entry in catalog.iter()? {
                let (name, schema) = entry?;
                let schema: TableSchema = serde_json::from_str(schema.value()).with_context(
                    || format!("corrupt catalog entry for table {}", name.value()),
                )?;
                schemas.insert(name.value().to_string(), schema);
            }
        }

        info!(path = %path.display(), tables = schemas.len(), "opened redb backend");
        Ok(Self {
            db: Arc::new(db),
            schemas,
        })
    }

    fn schema(&self, table: &str) -> Result<TableSchema, BackendError> {
        self.schemas
            .get(table)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BackendError::table_not_found(table))
    }

    /// Runs `f` against the database on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, BackendError>
    where
        F: FnOnce(&Database) -> Result<T, BackendError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .context("redb task panicked")?
    }
}

#[async_trait]
impl KeyValueBackend for RedbBackend {
    async fn create_table(&self, schema: TableSchema) -> Result<(), BackendError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(BackendError::TableExists { table: schema.name });
        }
        let stored = serde_json::to_string(&schema).context("failed to serialize schema")?;
        let name = schema.name.clone();
        self.blocking(move |db| {
            let txn = db.begin_write().context("begin write")?;
            {
                let mut catalog = txn.open_table(CATALOG).context("open catalog")?;
                if catalog.get(name.as_str()).context("read catalog")?.is_some() {
                    return Err(BackendError::TableExists { table: name });
                }
                catalog
                    .insert(name.as_str(), stored.as_str())
                    .context("write catalog")?;
                let items = items_table_name(&name);
                txn.open_table(items_def(&items)).context("create items table")?;
            }
            txn.commit().context("commit")?;
            Ok(())
        })
        .await?;

        debug!(table = %schema.name, "declared redb table");
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    async fn table_schema(&self, table: &str) -> Result<TableSchema, BackendError> {
        self.schema(table)
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<WriteOutput, BackendError> {
        let schema = self.schema(table)?;
        let key = encode_key(&schema.key_schema, &key_of_item(&schema.key_schema, &item)?)?;
        let json = encode_item(&item)?;
        let items = items_table_name(table);
        self.blocking(move |db| {
            let txn = db.begin_write().context("begin write")?;
            {
                let mut table = txn.open_table(items_def(&items)).context("open items")?;
                table
                    .insert(key.as_str(), json.as_str())
                    .context("insert item")?;
            }
            txn.commit().context("commit")?;
            Ok(WriteOutput {})
        })
        .await
    }

    async fn get_item(&self, table: &str, key: &Key) -> Result<GetItemOutput, BackendError> {
        let schema = self.schema(table)?;
        let key = encode_key(&schema.key_schema, key)?;
        let items = items_table_name(table);
        self.blocking(move |db| {
            let txn = db.begin_read().context("begin read")?;
            let table = match txn.open_table(items_def(&items)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(GetItemOutput::default()),
                Err(e) => return Err(anyhow::Error::from(e).context("open items").into()),
            };
            let item = match table.get(key.as_str()).context("read item")? {
                Some(json) => Some(decode_item(json.value())?),
                None => None,
            };
            Ok(GetItemOutput { item })
        })
        .await
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Key,
        updates: &BTreeMap<String, AttributeUpdate>,
    ) -> Result<WriteOutput, BackendError> {
        let schema = self.schema(table)?;
        let encoded = encode_key(&schema.key_schema, key)?;
        let items = items_table_name(table);
        let key = key.clone();
        let updates = updates.clone();
        self.blocking(move |db| {
            let txn = db.begin_write().context("begin write")?;
            {
                let mut table = txn.open_table(items_def(&items)).context("open items")?;
                let existing = match table.get(encoded.as_str()).context("read item")? {
                    Some(json) => Some(decode_item(json.value())?),
                    None => None,
                };
                let item = apply_updates(&schema.key_schema, &key, existing, &updates)?;
                let json = encode_item(&item)?;
                table
                    .insert(encoded.as_str(), json.as_str())
                    .context("write item")?;
            }
            // Returning early above drops `txn`, which aborts the transaction.
            txn.commit().context("commit")?;
            Ok(WriteOutput {})
        })
        .await
    }

    async fn delete_item(&self, table: &str, key: &Key) -> Result<WriteOutput, BackendError> {
        let schema = self.schema(table)?;
        let key = encode_key(&schema.key_schema, key)?;
        let items = items_table_name(table);
        self.blocking(move |db| {
            let txn = db.begin_write().context("begin write")?;
            {
                let mut table = txn.open_table(items_def(&items)).context("open items")?;
                table.remove(key.as_str()).context("remove item")?;
            }
            txn.commit().context("commit")?;
            Ok(WriteOutput {})
        })
        .await
    }

    async fn scan(&self, table: &str) -> Result<ScanOutput, BackendError> {
        self.schema(table)?;
        let items = items_table_name(table);
        self.blocking(move |db| {
            let txn = db.begin_read().context("begin read")?;
            let table = match txn.open_table(items_def(&items)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(ScanOutput::default()),
                Err(e) => return Err(anyhow::Error::from(e).context("open items").into()),
            };
            let mut out = Vec::new();
            for entry in table.iter().context("scan items")? {
                let (_, json) = entry.context("scan items")?;
                out.push(decode_item(json.value())?);
            }
            Ok(ScanOutput::from_items(out))
        })
        .await
    }
}
