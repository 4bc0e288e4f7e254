use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a board (a table owning a schema and items).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BoardId(u64);

impl BoardId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for BoardId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an item (a row on a board).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a column within a board.
///
/// Column ids are opaque strings assigned by the platform. The platform
/// conventionally prefixes ids of derived columns with their kind
/// (`formula_total`, `mirror_1`), which the strategy selector exploits as a
/// heuristic before the target schema is available.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id carries a derived-column prefix (`formula`, `mirror`,
    /// `lookup`). A heuristic only; the column's schema stays authoritative.
    pub fn has_complex_prefix(&self) -> bool {
        ["formula", "mirror", "lookup"]
            .iter()
            .any(|prefix| self.0.starts_with(prefix))
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The key a single resolution is identified by.
///
/// Used for the value cache, in-flight deduplication and cycle detection. Two
/// resolutions with the same key inside one session return identical scalars.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub board: BoardId,
    pub column: ColumnId,
    pub item: ItemId,
}

impl ResolutionKey {
    pub fn new(board: BoardId, column: ColumnId, item: ItemId) -> Self {
        Self {
            board,
            column,
            item,
        }
    }
}

impl fmt::Display for ResolutionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.board, self.column, self.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_prefix_heuristic() {
        assert!(ColumnId::new("formula_total").has_complex_prefix());
        assert!(ColumnId::new("mirror1").has_complex_prefix());
        assert!(ColumnId::new("lookup_5").has_complex_prefix());
        assert!(!ColumnId::new("numbers1").has_complex_prefix());
    }

    #[test]
    fn key_display() {
        let key = ResolutionKey::new(BoardId::new(123), ColumnId::new("formula1"), ItemId::new(100));
        assert_eq!(key.to_string(), "123/formula1@100");
    }
}
