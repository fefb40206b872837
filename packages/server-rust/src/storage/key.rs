//! Primary-key extraction and the canonical key encoding shared by backends.
//!
//! A key is encoded as the JSON array of its attribute values in schema order
//! (`["1234ABCD"]`, `["cust-1", 1700000000]`), so string `"5"` and number `5`
//! never collide. Numbers encode by value: `5`, `5.0` and `5e0` are one key.

use serde_json::{Number, Value};
use tablegate_core::{Item, Key, KeySchema};

use crate::traits::BackendError;

/// Validates `key` against `schema` and returns its storage encoding.
///
/// # Errors
///
/// Returns `Validation` if the key has extra or missing attributes, or a key
/// value is not a non-empty string or a number.
pub fn encode_key(schema: &KeySchema, key: &Key) -> Result<String, BackendError> {
    let expected = schema.attribute_names().count();
    if key.len() != expected {
        return Err(BackendError::validation(format!(
            "the provided key element does not match the schema: expected {expected} attribute(s), got {}",
            key.len()
        )));
    }

    let mut parts = Vec::with_capacity(expected);
    for attr in schema.attribute_names() {
        let value = key.get(attr).ok_or_else(|| {
            BackendError::validation(format!("missing key attribute '{attr}'"))
        })?;
        check_key_value(attr, value)?;
        parts.push(match value {
            Value::Number(n) => canonical_number(n),
            other => other.clone(),
        });
    }

    serde_json::to_string(&parts).map_err(|e| BackendError::Internal(e.into()))
}

/// Extracts the key attributes of `item`.
///
/// # Errors
///
/// Returns `Validation` if a key attribute is missing or has an invalid value.
pub fn key_of_item(schema: &KeySchema, item: &Item) -> Result<Key, BackendError> {
    let mut key = Key::new();
    for attr in schema.attribute_names() {
        let value = item.get(attr).ok_or_else(|| {
            BackendError::validation(format!("item is missing key attribute '{attr}'"))
        })?;
        check_key_value(attr, value)?;
        key.insert(attr.to_string(), value.clone());
    }
    Ok(key)
}

/// Whole-valued floats within `i64` range encode as integers.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
fn canonical_number(n: &Number) -> Value {
    if n.is_i64() || n.is_u64() {
        return Value::Number(n.clone());
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Value::from(f as i64)
        }
        _ => Value::Number(n.clone()),
    }
}

fn check_key_value(attr: &str, value: &Value) -> Result<(), BackendError> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(()),
        Value::Number(_) => Ok(()),
        Value::String(_) => Err(BackendError::validation(format!(
            "key attribute '{attr}' must not be empty"
        ))),
        _ => Err(BackendError::validation(format!(
            "key attribute '{attr}' must be a string or a number"
        ))),
    }
}
