use crate::cancel::{race_cancel, CancelSignal};
use crate::client::QueryClient;
use formula_resolver_model::{BoardId, ColumnDef, ColumnId, ResolveError, ResolveResult};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A board's schema: its columns in upstream order.
#[derive(Debug, Clone, Default)]
pub struct BoardSchema {
    columns: Vec<ColumnDef>,
    by_id: FxHashMap<ColumnId, usize>,
}

impl BoardSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        let by_id = columns
            .iter()
            .enumerate()
            .map(|(index, def)| (def.id.clone(), index))
            .collect();
        Self { columns, by_id }
    }

    pub fn column(&self, id: &ColumnId) -> Option<&ColumnDef> {
        self.by_id.get(id).map(|&index| &self.columns[index])
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }
}

type SharedSchemaFetch = Shared<BoxFuture<'static, ResolveResult<Arc<BoardSchema>>>>;

enum SchemaEntry {
    Ready {
        schema: Arc<BoardSchema>,
        fetched_at: Instant,
    },
    Pending(SharedSchemaFetch),
}

/// Per-session schema cache.
///
/// The first touch of a board fetches all of its columns in one query; later
/// lookups are synchronous. A pending-fetch map makes a second resolver await
/// the first fetch instead of issuing a duplicate.
pub(crate) struct SchemaCache {
    ttl: Duration,
    entries: Mutex<FxHashMap<BoardId, SchemaEntry>>,
}

impl SchemaCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    pub(crate) async fn board_schema(
        &self,
        client: &Arc<dyn QueryClient>,
        cancel: &CancelSignal,
        board: BoardId,
    ) -> ResolveResult<Arc<BoardSchema>> {
        let fetch = {
            let mut entries = self.entries.lock().expect("schema cache poisoned");
            match entries.get(&board) {
                Some(SchemaEntry::Ready { schema, fetched_at })
                    if fetched_at.elapsed() < self.ttl =>
                {
                    return Ok(Arc::clone(schema));
                }
                Some(SchemaEntry::Pending(fetch)) => fetch.clone(),
                _ => {
                    let client = Arc::clone(client);
                    let cancel = cancel.clone();
                    let fetch = async move {
                        let columns = race_cancel(&cancel, client.board_schema(board)).await?;
                        if columns.is_empty() {
                            return Err(ResolveError::MissingSchema(board));
                        }
                        Ok(Arc::new(BoardSchema::new(columns)))
                    }
                    .boxed()
                    .shared();
                    entries.insert(board, SchemaEntry::Pending(fetch.clone()));
                    fetch
                }
            }
        };

        let result = fetch.await;
        let mut entries = self.entries.lock().expect("schema cache poisoned");
        match &result {
            Ok(schema) => {
                entries.insert(
                    board,
                    SchemaEntry::Ready {
                        schema: Arc::clone(schema),
                        fetched_at: Instant::now(),
                    },
                );
            }
            Err(_) => {
                // Allow a later resolve to retry.
                if matches!(entries.get(&board), Some(SchemaEntry::Pending(_))) {
                    entries.remove(&board);
                }
            }
        }
        result
    }

    /// A schema that is already cached and fresh, without fetching. The
    /// strategy selector uses this: it must never trigger remote work itself.
    pub(crate) fn peek(&self, board: BoardId) -> Option<Arc<BoardSchema>> {
        let entries = self.entries.lock().expect("schema cache poisoned");
        match entries.get(&board) {
            Some(SchemaEntry::Ready { schema, fetched_at }) if fetched_at.elapsed() < self.ttl => {
                Some(Arc::clone(schema))
            }
            _ => None,
        }
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().expect("schema cache poisoned").clear();
    }
}
