use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored record: attribute name to JSON value.
pub type Item = Map<String, Value>;

/// The key attributes identifying a single item.
pub type Key = Map<String, Value>;

/// Names of the attributes that make up a table's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySchema {
    /// Partition (hash) key attribute.
    pub partition_key: String,
    /// Optional sort (range) key attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
}

impl KeySchema {
    /// Schema with only a partition key.
    #[must_use]
    pub fn new(partition_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    /// Adds a sort key.
    #[must_use]
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Key attribute names, partition key first.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.partition_key.as_str()).chain(self.sort_key.as_deref())
    }

    /// Whether `name` is one of the key attributes.
    #[must_use]
    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.attribute_names().any(|attr| attr == name)
    }
}

/// A named table and its key schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub name: String,
    pub key_schema: KeySchema,
}

impl TableSchema {
    #[must_use]
    pub fn new(name: impl Into<String>, key_schema: KeySchema) -> Self {
        Self {
            name: name.into(),
            key_schema,
        }
    }
}

/// Errors from parsing a `name:partitionKey[:sortKey]` table spec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaParseError {
    #[error("table spec is empty")]
    Empty,
    #[error("table spec '{spec}' must be name:partitionKey[:sortKey]")]
    Malformed { spec: String },
}

impl FromStr for TableSchema {
    type Err = SchemaParseError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(SchemaParseError::Empty);
        }
        let malformed = || SchemaParseError::Malformed {
            spec: spec.to_string(),
        };

        let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(malformed());
        }
        match parts.as_slice() {
            [name, pk] => Ok(Self::new(*name, KeySchema::new(*pk))),
            [name, pk, sk] if pk != sk => {
                Ok(Self::new(*name, KeySchema::new(*pk).with_sort_key(*sk)))
            }
            _ => Err(malformed()),
        }
    }
}

/// What an attribute update does to its attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateAction {
    /// Set the attribute to `Value`.
    #[default]
    Put,
    /// Numeric increment or array union.
    Add,
    /// Remove the attribute, or remove elements from an array attribute.
    Delete,
}

/// A single entry of an `AttributeUpdates` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct AttributeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default)]
    pub action: UpdateAction,
}
