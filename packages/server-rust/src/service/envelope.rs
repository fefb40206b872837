//! Gateway event unwrapping.
//!
//! A function invoked directly receives the request object itself. Behind an
//! HTTP gateway proxy integration the request arrives as the event's `body`,
//! usually JSON-encoded into a string.

use serde_json::{Map, Value};

use super::operation::OperationError;

/// Extracts the request object from a raw invocation event.
///
/// - no `body` field: the event is the request
/// - `body` is `null`: empty request (reported later as `MissingOperation`)
/// - `body` is an object: used as-is
/// - `body` is a string: parsed as JSON
///
/// # Errors
///
/// Returns `MalformedRequest` if the event is not an object, the body string
/// is not valid JSON or does not encode an object, or the body has any other
/// JSON type.
pub fn unwrap_gateway_body(event: Value) -> Result<Value, OperationError> {
    let Value::Object(mut object) = event else {
        return Err(malformed("event must be a JSON object"));
    };

    let Some(body) = object.remove("body") else {
        return Ok(Value::Object(object));
    };

    match body {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(body),
        Value::String(text) => {
            let parsed: Value = serde_json::from_str(&text)
                .map_err(|e| malformed(format!("body is not valid JSON: {e}")))?;
            if parsed.is_object() {
                Ok(parsed)
            } else {
                Err(malformed("body must encode a JSON object"))
            }
        }
        _ => Err(malformed("body must be a JSON object or string")),
    }
}

fn malformed(reason: impl Into<String>) -> OperationError {
    OperationError::MalformedRequest {
        reason: reason.into(),
    }
}
