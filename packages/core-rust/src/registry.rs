//! The fixed set of operations a request may name.
//!
//! The registry is an enum rather than a runtime map: the supported set is
//! visible in one place and cannot change after the binary is built.

use std::fmt;

/// Wire names of all supported operations.
pub mod operation_names {
    pub const CREATE: &str = "create";
    pub const READ: &str = "read";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const LIST: &str = "list";
    pub const ECHO: &str = "echo";
    pub const PING: &str = "ping";
}

/// One entry of the operation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Insert or replace an item.
    Create,
    /// Fetch a single item by key.
    Read,
    /// Apply a partial update, creating the item if absent.
    Update,
    /// Remove an item by key.
    Delete,
    /// Scan the whole table.
    List,
    /// Return the payload unchanged.
    Echo,
    /// Return a fixed literal.
    Ping,
}

impl OperationKind {
    /// Every registered operation, in declaration order.
    pub const ALL: [OperationKind; 7] = [
        OperationKind::Create,
        OperationKind::Read,
        OperationKind::Update,
        OperationKind::Delete,
        OperationKind::List,
        OperationKind::Echo,
        OperationKind::Ping,
    ];

    /// Resolves a wire name. Matching is exact and case-sensitive.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            operation_names::CREATE => Some(Self::Create),
            operation_names::READ => Some(Self::Read),
            operation_names::UPDATE => Some(Self::Update),
            operation_names::DELETE => Some(Self::Delete),
            operation_names::LIST => Some(Self::List),
            operation_names::ECHO => Some(Self::Echo),
            operation_names::PING => Some(Self::Ping),
            _ => None,
        }
    }

    /// The wire name of this operation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => operation_names::CREATE,
            Self::Read => operation_names::READ,
            Self::Update => operation_names::UPDATE,
            Self::Delete => operation_names::DELETE,
            Self::List => operation_names::LIST,
            Self::Echo => operation_names::ECHO,
            Self::Ping => operation_names::PING,
        }
    }

    /// Whether the operation acts on a storage table and so needs `tableName`.
    #[must_use]
    pub const fn requires_table(self) -> bool {
        !matches!(self, Self::Echo | Self::Ping)
    }

    /// Whether the operation writes to the backend.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
