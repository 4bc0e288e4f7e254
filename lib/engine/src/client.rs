use crate::columns::RawColumnValue;
use async_trait::async_trait;
use formula_resolver_model::{BoardId, ColumnDef, ColumnId, ColumnKind, ItemId};
use serde::Deserialize;
use std::collections::HashMap;

/// The error type query clients surface. The resolver wraps it into
/// [formula_resolver_model::ResolveError::Remote] with the cause chained.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The result of a display-value query for one `(item, column)` pair.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ColumnValueRecord {
    #[serde(default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub text: Option<String>,
    /// Populated for numeric columns.
    #[serde(default)]
    pub number: Option<f64>,
    /// The platform's precomputed display string; may be empty or stale.
    #[serde(default)]
    pub display_value: Option<String>,
}

/// One linked row reached through a `board_relation` column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkedItemRef {
    pub board: BoardId,
    pub item: ItemId,
    #[serde(default)]
    pub name: String,
}

/// The result of a deep-mirror query: the platform's cached display value
/// plus the linked items behind the mirror.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeepMirrorRecord {
    #[serde(default)]
    pub display_value: Option<String>,
    #[serde(default)]
    pub mirrored_items: Vec<LinkedItemRef>,
}

/// The remote query capability the resolver core consumes.
///
/// Implementations own transport, retries, auth and request chunking below
/// the documented sizes; the core issues nothing beyond these five requests
/// and calls them concurrently.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// All column definitions of a board, settings decoded. An empty list
    /// means the board is unknown to the platform.
    async fn board_schema(&self, board: BoardId) -> Result<Vec<ColumnDef>, ClientError>;

    /// The display value of one column on one item.
    async fn display_value(
        &self,
        board: BoardId,
        item: ItemId,
        column: &ColumnId,
    ) -> Result<ColumnValueRecord, ClientError>;

    /// The display values of one column across many items. The core chunks
    /// requests at 100 items; implementations may assume `items.len() <= 100`.
    async fn display_values(
        &self,
        board: BoardId,
        items: &[ItemId],
        column: &ColumnId,
    ) -> Result<HashMap<ItemId, ColumnValueRecord>, ClientError>;

    /// The deep-mirror query: cached display value plus linked items.
    async fn deep_mirror(
        &self,
        board: BoardId,
        item: ItemId,
        column: &ColumnId,
    ) -> Result<DeepMirrorRecord, ClientError>;

    /// The multi-column deep query: raw payloads for several columns of one
    /// item in a single round-trip. Columns absent from the result are
    /// treated as having no value.
    async fn item_columns(
        &self,
        board: BoardId,
        item: ItemId,
        columns: &[ColumnId],
    ) -> Result<HashMap<ColumnId, RawColumnValue>, ClientError>;
}
