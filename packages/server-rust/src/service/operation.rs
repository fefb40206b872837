use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tablegate_core::{
    GetItemOutput, KeyPayload, OperationKind, PutItemPayload, ScanOutput, UpdateItemPayload,
    WriteOutput, PING_RESPONSE,
};

use crate::traits::BackendError;

/// Context carried with every operation through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    /// Correlation id (the invocation's request id when the transport has one).
    pub request_id: String,
    /// Registry entry the request resolved to.
    pub kind: OperationKind,
    /// Target table, for storage operations.
    pub table_name: Option<String>,
}

impl OperationContext {
    #[must_use]
    pub fn new(request_id: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            request_id: request_id.into(),
            kind,
            table_name: None,
        }
    }
}

/// Typed operation variants, one per registry entry.
///
/// Storage variants carry their table name and an already-validated payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create {
        ctx: OperationContext,
        table: String,
        payload: PutItemPayload,
    },
    Read {
        ctx: OperationContext,
        table: String,
        payload: KeyPayload,
    },
    Update {
        ctx: OperationContext,
        table: String,
        payload: UpdateItemPayload,
    },
    Delete {
        ctx: OperationContext,
        table: String,
        payload: KeyPayload,
    },
    List {
        ctx: OperationContext,
        table: String,
    },
    Echo {
        ctx: OperationContext,
        payload: Value,
    },
    Ping {
        ctx: OperationContext,
    },
}

impl Operation {
    /// Returns the context of this operation.
    #[must_use]
    pub fn ctx(&self) -> &OperationContext {
        match self {
            Self::Create { ctx, .. }
            | Self::Read { ctx, .. }
            | Self::Update { ctx, .. }
            | Self::Delete { ctx, .. }
            | Self::List { ctx, .. }
            | Self::Echo { ctx, .. }
            | Self::Ping { ctx } => ctx,
        }
    }

    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.ctx().kind
    }
}

/// Successful result of an operation, returned to the caller unmodified.
///
/// Serializes to exactly the backend output, the echoed payload, or the
/// ping literal; no envelope is added.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResponse {
    /// `create`, `update`, `delete`.
    Written(WriteOutput),
    /// `read`.
    Item(GetItemOutput),
    /// `list`.
    Items(ScanOutput),
    /// `echo`.
    Echo(Value),
    /// `ping`.
    Pong,
}

impl OperationResponse {
    /// Converts the response into its JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error only if an item holds a value `serde_json` cannot
    /// represent, which cannot happen for items decoded from JSON.
    pub fn into_json(self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for OperationResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Written(out) => out.serialize(serializer),
            Self::Item(out) => out.serialize(serializer),
            Self::Items(out) => out.serialize(serializer),
            Self::Echo(payload) => payload.serialize(serializer),
            Self::Pong => serializer.serialize_str(PING_RESPONSE),
        }
    }
}

/// Stable classification of [`OperationError`] for transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingOperation,
    UnrecognizedOperation,
    MissingTable,
    InvalidPayload,
    MalformedRequest,
    Backend,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingOperation => "MissingOperation",
            Self::UnrecognizedOperation => "UnrecognizedOperation",
            Self::MissingTable => "MissingTable",
            Self::InvalidPayload => "InvalidPayload",
            Self::MalformedRequest => "MalformedRequest",
            Self::Backend => "BackendError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by classification and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("request has no operation")]
    MissingOperation,
    #[error("unrecognized operation: {name:?}")]
    UnrecognizedOperation { name: String },
    #[error("operation '{operation}' requires a tableName")]
    MissingTable { operation: OperationKind },
    #[error("invalid payload for '{operation}': {reason}")]
    InvalidPayload {
        operation: OperationKind,
        reason: String,
    },
    #[error("malformed request: {reason}")]
    MalformedRequest { reason: String },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl OperationError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingOperation => ErrorKind::MissingOperation,
            Self::UnrecognizedOperation { .. } => ErrorKind::UnrecognizedOperation,
            Self::MissingTable { .. } => ErrorKind::MissingTable,
            Self::InvalidPayload { .. } => ErrorKind::InvalidPayload,
            Self::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            Self::Backend(_) => ErrorKind::Backend,
        }
    }

    /// Whether the caller can fix the failure by changing the request.
    ///
    /// Only internal backend failures are server-side.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Backend(BackendError::Internal(_)))
    }
}
