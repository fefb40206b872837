//! Result shapes of the storage operations, as returned to the caller.

use serde::{Deserialize, Serialize};

use crate::types::Item;

/// Literal returned by `ping`.
pub const PING_RESPONSE: &str = "pong";

/// Result of `read`. Serializes to `{}` when the item does not exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
}

/// Result of `list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScanOutput {
    pub items: Vec<Item>,
    pub count: usize,
    pub scanned_count: usize,
}

impl ScanOutput {
    /// Builds a scan result for an unfiltered scan.
    #[must_use]
    pub fn from_items(items: Vec<Item>) -> Self {
        let count = items.len();
        Self {
            items,
            count,
            scanned_count: count,
        }
    }
}

/// Result of `create`, `update` and `delete`. Serializes to `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutput {}
