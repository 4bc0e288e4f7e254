use crate::cache::{InflightMap, ValueCache};
use crate::cancel::CancelSignal;
use crate::client::QueryClient;
use crate::coordinator::RequestCoordinator;
use crate::resolver::{self, CallStack, CycleDefault};
use crate::schema::SchemaCache;
use formula_resolver_functions::FunctionContext;
use formula_resolver_model::{BoardId, ColumnId, ItemId, ResolutionKey, ResolveResult, Scalar};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Configuration of a [ResolverSession]. The set is closed; the core owns no
/// environment variables, files or wire formats.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How long the coordinator keeps a batch open for siblings to join.
    /// Zero is valid and merely trades batching for latency.
    pub batch_window: Duration,
    /// How long a fetched board schema stays fresh within the session.
    pub schema_ttl: Duration,
    /// The scalar returned when resolution re-enters a key on the current
    /// call stack inside a numeric aggregation context.
    pub cycle_break_numeric_default: f64,
    /// Emits per-resolve summary events at debug level.
    pub debug_log: bool,
    /// Cooperative cancellation, propagated into every remote call.
    pub cancel: Option<CancelSignal>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            batch_window: Duration::from_millis(5),
            schema_ttl: Duration::from_millis(300_000),
            cycle_break_numeric_default: 0.0,
            debug_log: false,
            cancel: None,
        }
    }
}

pub(crate) struct SessionInner {
    pub(crate) client: Arc<dyn QueryClient>,
    pub(crate) options: SessionOptions,
    pub(crate) cancel: CancelSignal,
    pub(crate) schemas: SchemaCache,
    pub(crate) values: ValueCache,
    pub(crate) inflight: InflightMap,
    pub(crate) coordinator: Arc<RequestCoordinator>,
    pub(crate) fn_ctx: FunctionContext,
}

/// One resolver session: created per top-level call, owns every cache and the
/// request coordinator, and is discarded when the call returns.
///
/// A session is not meant to be shared across concurrent top-level calls; all
/// the parallelism it contains fans out *within* one call.
pub struct ResolverSession {
    inner: Arc<SessionInner>,
}

/// Creates a session around a query client. The session clock is captured
/// here, so `TODAY()`/`NOW()` are stable for the session's lifetime.
///
/// Sessions must be created inside the async runtime: the coordinator arms
/// its batch timers with spawned tasks.
pub fn new_session(client: Arc<dyn QueryClient>, options: SessionOptions) -> ResolverSession {
    ResolverSession::new(client, options)
}

impl ResolverSession {
    pub fn new(client: Arc<dyn QueryClient>, options: SessionOptions) -> Self {
        let cancel = options.cancel.clone().unwrap_or_else(CancelSignal::never);
        let coordinator = RequestCoordinator::new(
            Arc::clone(&client),
            cancel.clone(),
            options.batch_window,
        );
        if options.cancel.is_some() {
            coordinator.spawn_cancel_watcher();
        }
        let schemas = SchemaCache::new(options.schema_ttl);
        Self {
            inner: Arc::new(SessionInner {
                client,
                options,
                cancel,
                schemas,
                values: ValueCache::default(),
                inflight: InflightMap::default(),
                coordinator,
                fn_ctx: FunctionContext::capture(),
            }),
        }
    }

    /// Resolves one column of one item to the scalar a user would see.
    ///
    /// Only remote failures and cancellation surface as errors; parse
    /// problems and unknown boards or columns degrade to the empty scalar.
    pub async fn resolve(
        &self,
        board: BoardId,
        column: ColumnId,
        item: ItemId,
    ) -> ResolveResult<Scalar> {
        let key = ResolutionKey::new(board, column, item);
        resolver::resolve_key(
            Arc::clone(&self.inner),
            key,
            CallStack::new(),
            CycleDefault::Text,
        )
        .await
    }

    /// Resolves one column across many items, batching remote work.
    pub async fn resolve_batch(
        &self,
        board: BoardId,
        column: ColumnId,
        items: &[ItemId],
    ) -> ResolveResult<HashMap<ItemId, Scalar>> {
        resolver::resolve_batch(
            Arc::clone(&self.inner),
            board,
            column,
            items.to_vec(),
            CallStack::new(),
            CycleDefault::Text,
        )
        .await
    }

    /// Forces every pending coordinator batch out immediately.
    pub async fn flush(&self) {
        self.inner.coordinator.flush().await;
    }

    /// Flushes outstanding batches and releases the caches.
    pub async fn close(self) {
        self.inner.coordinator.flush().await;
        self.inner.values.clear();
        self.inner.inflight.clear();
        self.inner.schemas.clear();
    }
}
