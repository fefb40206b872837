//! Operation routing and execution.
//!
//! Every request goes through the same pipeline:
//!
//! 1. **Envelope** (`envelope`): gateway event -> request body
//! 2. **Classification** (`classify`): `Request` -> `Result<Operation, OperationError>`
//! 3. **Middleware** (`middleware`): Tower layers (tracing span, timing, outcome)
//! 4. **Routing** (`router`): Dispatch to the storage backend, or answer
//!    `echo`/`ping` directly

pub mod classify;
pub mod config;
pub mod envelope;
pub mod middleware;
pub mod operation;
pub mod router;

// Re-export key types for convenient access.
pub use classify::classify_request;
pub use config::{BackendKind, RouterConfig};
pub use envelope::unwrap_gateway_body;
pub use operation::{ErrorKind, Operation, OperationContext, OperationError, OperationResponse};
pub use router::OperationRouter;
