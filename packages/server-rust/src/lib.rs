//! `TableGate` Server — operation router over a key-value table backend.

pub mod logging;
pub mod service;
pub mod storage;
pub mod traits;

pub use service::{OperationError, OperationResponse, OperationRouter, RouterConfig};
pub use traits::{BackendError, KeyValueBackend};
