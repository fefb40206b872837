//! Application of `AttributeUpdates` to a stored item.

use std::collections::BTreeMap;

use serde_json::{Number, Value};
use tablegate_core::{AttributeUpdate, Item, Key, KeySchema, UpdateAction};

use crate::traits::BackendError;

/// Applies `updates` to `existing`, or to a fresh item built from `key` when
/// the item does not exist yet (upsert).
///
/// # Errors
///
/// Returns `Validation` if an update targets a key attribute, a `PUT` has no
/// value, or an `ADD`/`DELETE` value does not fit the current attribute type.
pub fn apply_updates(
    schema: &KeySchema,
    key: &Key,
    existing: Option<Item>,
    updates: &BTreeMap<String, AttributeUpdate>,
) -> Result<Item, BackendError> {
    if let Some(attr) = updates.keys().find(|name| schema.is_key_attribute(name)) {
        return Err(BackendError::validation(format!(
            "cannot update key attribute '{attr}'"
        )));
    }

    let mut item = existing.unwrap_or_else(|| key.clone());
    for (name, update) in updates {
        apply_one(&mut item, name, update)?;
    }
    Ok(item)
}

fn apply_one(item: &mut Item, name: &str, update: &AttributeUpdate) -> Result<(), BackendError> {
    match (update.action, &update.value) {
        (UpdateAction::Put, Some(value)) => {
            item.insert(name.to_string(), value.clone());
        }
        (UpdateAction::Put, None) => {
            return Err(BackendError::validation(format!(
                "PUT on '{name}' requires a Value"
            )));
        }
        (UpdateAction::Delete, None) => {
            item.remove(name);
        }
        (UpdateAction::Delete, Some(Value::Array(remove))) => match item.get_mut(name) {
            None => {}
            Some(Value::Array(current)) => current.retain(|v| !remove.contains(v)),
            Some(_) => {
                return Err(BackendError::validation(format!(
                    "DELETE with a Value requires '{name}' to be an array"
                )));
            }
        },
        (UpdateAction::Delete, Some(_)) => {
            return Err(BackendError::validation(format!(
                "DELETE Value for '{name}' must be an array"
            )));
        }
        (UpdateAction::Add, Some(Value::Number(delta))) => {
            let sum = match item.get(name) {
                None => delta.clone(),
                Some(Value::Number(current)) => add_numbers(current, delta)?,
                Some(_) => {
                    return Err(BackendError::validation(format!(
                        "ADD of a number requires '{name}' to be a number"
                    )));
                }
            };
            item.insert(name.to_string(), Value::Number(sum));
        }
        (UpdateAction::Add, Some(Value::Array(extra))) => {
            let entry = item
                .entry(name.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            let Value::Array(current) = entry else {
                return Err(BackendError::validation(format!(
                    "ADD of an array requires '{name}' to be an array"
                )));
            };
            for value in extra {
                if !current.contains(value) {
                    current.push(value.clone());
                }
            }
        }
        (UpdateAction::Add, _) => {
            return Err(BackendError::validation(format!(
                "ADD on '{name}' requires a number or array Value"
            )));
        }
    }
    Ok(())
}

fn add_numbers(a: &Number, b: &Number) -> Result<Number, BackendError> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(sum.into());
        }
    }
    let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
        return Err(BackendError::validation("ADD operand is not representable"));
    };
    Number::from_f64(x + y).ok_or_else(|| BackendError::validation("ADD result is not finite"))
}
