//! Request classification: converts a wire `Request` into a typed `Operation`.
//!
//! All request-level validation happens here, once per operation kind, so
//! dispatch only ever sees well-formed operations:
//!
//! 1. `operation` present, else `MissingOperation`
//! 2. `operation` registered, else `UnrecognizedOperation`
//! 3. `tableName` present for storage operations, else `MissingTable`
//! 4. payload matches the operation's shape, else `InvalidPayload`

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tablegate_core::{OperationKind, Request, ScanPayload};

use super::operation::{Operation, OperationContext, OperationError};

/// Classify `request` into an `Operation` tagged with `request_id`.
///
/// A missing payload is treated as `{}`. `ping` ignores its payload
/// entirely; `echo` keeps it as-is, whatever its JSON type.
///
/// # Errors
///
/// Returns the first failing check in the order listed in the module docs.
pub fn classify_request(
    request: Request,
    request_id: impl Into<String>,
) -> Result<Operation, OperationError> {
    let Request {
        operation,
        table_name,
        payload,
    } = request;

    let name = operation.ok_or(OperationError::MissingOperation)?;
    let kind = OperationKind::from_name(&name)
        .ok_or_else(|| OperationError::UnrecognizedOperation { name: name.clone() })?;

    let mut ctx = OperationContext::new(request_id, kind);
    let payload = payload.unwrap_or_else(|| Value::Object(Map::new()));

    // Echo and ping never see a table, even when the request names one.
    let table = if kind.requires_table() {
        bind_table(&mut ctx, table_name)?
    } else {
        String::new()
    };

    let op = match kind {
        OperationKind::Echo => Operation::Echo { ctx, payload },
        OperationKind::Ping => Operation::Ping { ctx },
        OperationKind::Create => Operation::Create {
            ctx,
            table,
            payload: parse_payload(kind, payload)?,
        },
        OperationKind::Read => Operation::Read {
            ctx,
            table,
            payload: parse_payload(kind, payload)?,
        },
        OperationKind::Update => Operation::Update {
            ctx,
            table,
            payload: parse_payload(kind, payload)?,
        },
        OperationKind::Delete => Operation::Delete {
            ctx,
            table,
            payload: parse_payload(kind, payload)?,
        },
        OperationKind::List => {
            let ScanPayload {} = parse_payload(kind, payload)?;
            Operation::List { ctx, table }
        }
    };
    Ok(op)
}

/// Resolves the target table of a storage operation. Blank names count as missing.
fn bind_table(
    ctx: &mut OperationContext,
    table_name: Option<String>,
) -> Result<String, OperationError> {
    let table = table_name
        .filter(|t| !t.trim().is_empty())
        .ok_or(OperationError::MissingTable {
            operation: ctx.kind,
        })?;
    ctx.table_name = Some(table.clone());
    Ok(table)
}

fn parse_payload<T: DeserializeOwned>(
    kind: OperationKind,
    payload: Value,
) -> Result<T, OperationError> {
    serde_json::from_value(payload).map_err(|e| OperationError::InvalidPayload {
        operation: kind,
        reason: e.to_string(),
    })
}
