use std::path::PathBuf;

use tablegate_core::TableSchema;

use crate::logging::LogFormat;

/// Which [`KeyValueBackend`](crate::traits::KeyValueBackend) to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Process-local `DashMap` tables.
    #[default]
    Memory,
    /// Durable `redb` database file.
    Redb,
}

/// Process-level configuration for the router and its backend.
///
/// The router itself is configuration-free; this only describes how the
/// hosting binary builds the backend and logging.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Tables declared at startup.
    pub tables: Vec<TableSchema>,
    /// Backend implementation.
    pub backend: BackendKind,
    /// Database file for [`BackendKind::Redb`].
    pub db_path: PathBuf,
    /// Output format of the tracing subscriber.
    pub log_format: LogFormat,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            backend: BackendKind::Memory,
            db_path: PathBuf::from("tablegate.redb"),
            log_format: LogFormat::Compact,
        }
    }
}
