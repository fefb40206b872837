//! Typed payloads for the storage operations.
//!
//! Field names follow the gateway's PascalCase convention. Unknown fields are
//! rejected so that unsupported parameters (conditions, projections, paging)
//! fail loudly instead of being ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{AttributeUpdate, Item, Key};

/// Payload of `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct PutItemPayload {
    pub item: Item,
}

/// Payload of `read` and `delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct KeyPayload {
    pub key: Key,
}

/// Payload of `update`.
///
/// `AttributeUpdates` may be omitted, in which case the update only ensures
/// the item exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct UpdateItemPayload {
    pub key: Key,
    #[serde(default)]
    pub attribute_updates: BTreeMap<String, AttributeUpdate>,
}

/// Payload of `list`. Scans take no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanPayload {}
