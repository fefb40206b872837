//! Key-value storage behind the operation router.
//!
//! - [`StorageEngine`]: per-table in-memory map
//! - [`backends`]: [`KeyValueBackend`] implementations built on engines or
//!   on an embedded database
//! - [`key`] / [`update`]: key encoding and update semantics shared by all
//!   backends
//!
//! [`build_backend`] turns a [`RouterConfig`] into a ready backend with all
//! configured tables declared.

pub mod backends;
pub mod engine;
pub mod engines;
pub mod key;
pub mod update;

use std::sync::Arc;

use tablegate_core::TableSchema;
use tracing::{debug, info};

pub use backends::InMemoryBackend;
#[cfg(feature = "redb")]
pub use backends::RedbBackend;
pub use engine::*;

use crate::service::config::{BackendKind, RouterConfig};
use crate::traits::{BackendError, KeyValueBackend};

/// Builds the configured backend and declares the configured tables.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened, the binary was built
/// without the requested backend, or a configured table already exists
/// with a different key schema.
pub async fn build_backend(config: &RouterConfig) -> anyhow::Result<Arc<dyn KeyValueBackend>> {
    let backend: Arc<dyn KeyValueBackend> = match config.backend {
        BackendKind::Memory => Arc::new(InMemoryBackend::new()),
        #[cfg(feature = "redb")]
        BackendKind::Redb => Arc::new(RedbBackend::open(&config.db_path)?),
        #[cfg(not(feature = "redb"))]
        BackendKind::Redb => anyhow::bail!("built without the `redb` feature"),
    };
    ensure_tables(backend.as_ref(), &config.tables).await?;
    info!(backend = ?config.backend, tables = config.tables.len(), "storage backend ready");
    Ok(backend)
}

/// Declares every table in `tables`, accepting tables that already exist
/// with an identical schema.
///
/// # Errors
///
/// Returns `Validation` if an existing table has a different key schema,
/// or any other backend error from declaring a table.
pub async fn ensure_tables(
    backend: &dyn KeyValueBackend,
    tables: &[TableSchema],
) -> Result<(), BackendError> {
    for schema in tables {
        match backend.create_table(schema.clone()).await {
            Ok(()) => debug!(table = %schema.name, "table declared"),
            Err(BackendError::TableExists { .. }) => {
                let existing = backend.table_schema(&schema.name).await?;
                if existing != *schema {
                    return Err(BackendError::validation(format!(
                        "table '{}' already exists with key schema {:?}",
                        schema.name, existing.key_schema
                    )));
                }
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
