//! [`KeyValueBackend`](crate::traits::KeyValueBackend) implementations.
//!
//! - [`InMemoryBackend`]: `DashMap` engines, process lifetime
//! - [`RedbBackend`]: durable single-file storage (feature `redb`)

mod memory;
#[cfg(feature = "redb")]
mod redb_backend;

pub use memory::InMemoryBackend;
#[cfg(feature = "redb")]
pub use redb_backend::RedbBackend;
