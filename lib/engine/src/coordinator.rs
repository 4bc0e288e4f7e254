use crate::cancel::{race_cancel, CancelSignal};
use crate::client::QueryClient;
use crate::columns::RawColumnValue;
use formula_resolver_model::{BoardId, ColumnId, ItemId, ResolveError, ResolveResult};
use futures::future::join_all;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

type BatchResult = ResolveResult<Option<RawColumnValue>>;

struct PendingBatch {
    generation: u64,
    columns: Vec<ColumnId>,
    waiters: Vec<(ColumnId, oneshot::Sender<BatchResult>)>,
}

/// Coalesces sibling column requests for the same item into one multi-column
/// deep query.
///
/// Requests arriving within the batch window join the open batch for their
/// `(board, item)` pair; when the window closes the coordinator issues a
/// single remote call and distributes the per-column results. The window is a
/// latency-versus-batching knob only: with a zero window every request still
/// resolves correctly, just in smaller batches.
pub(crate) struct RequestCoordinator {
    client: Arc<dyn QueryClient>,
    cancel: CancelSignal,
    window: Duration,
    pending: Mutex<FxHashMap<(BoardId, ItemId), PendingBatch>>,
    generations: std::sync::atomic::AtomicU64,
}

impl RequestCoordinator {
    pub(crate) fn new(
        client: Arc<dyn QueryClient>,
        cancel: CancelSignal,
        window: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            cancel,
            window,
            pending: Mutex::new(FxHashMap::default()),
            generations: std::sync::atomic::AtomicU64::new(0),
        })
    }

    /// Requests one column of one item, batched with whatever else asks for
    /// the same item inside the window. `None` means the remote result had no
    /// value for the column.
    pub(crate) async fn request(
        self: Arc<Self>,
        board: BoardId,
        item: ItemId,
        column: ColumnId,
    ) -> BatchResult {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().expect("coordinator poisoned");
            match pending.get_mut(&(board, item)) {
                Some(batch) => {
                    if !batch.columns.contains(&column) {
                        batch.columns.push(column.clone());
                    }
                    batch.waiters.push((column, tx));
                }
                None => {
                    let generation = self
                        .generations
                        .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    pending.insert(
                        (board, item),
                        PendingBatch {
                            generation,
                            columns: vec![column.clone()],
                            waiters: vec![(column, tx)],
                        },
                    );
                    let coordinator = Arc::clone(&self);
                    tokio::spawn(async move {
                        tokio::time::sleep(coordinator.window).await;
                        coordinator.close_batch(board, item, generation).await;
                    });
                }
            }
        }
        match rx.await {
            Ok(result) => result,
            // The batch was dropped without settling, which only happens on
            // teardown.
            Err(_) => Err(ResolveError::Cancelled),
        }
    }

    /// Rejects every pending batch as soon as the session's cancellation
    /// signal fires, instead of letting subscribers wait out their windows.
    /// Exits quietly when the handle is dropped without cancelling.
    pub(crate) fn spawn_cancel_watcher(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if cancel.fired().await {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.flush().await;
                }
            }
        });
    }

    /// Forces every pending batch out immediately.
    pub(crate) async fn flush(&self) {
        let batches: Vec<_> = {
            let mut pending = self.pending.lock().expect("coordinator poisoned");
            pending.drain().collect()
        };
        if batches.is_empty() {
            return;
        }
        debug!(batches = batches.len(), "flushing coordinator batches");
        join_all(
            batches
                .into_iter()
                .map(|((board, item), batch)| self.execute(board, item, batch)),
        )
        .await;
    }

    /// Closes the batch the timer was armed for. A flush that already emptied
    /// the slot (or replaced it with a younger batch) wins.
    async fn close_batch(&self, board: BoardId, item: ItemId, generation: u64) {
        let batch = {
            let mut pending = self.pending.lock().expect("coordinator poisoned");
            match pending.get(&(board, item)) {
                Some(batch) if batch.generation == generation => pending.remove(&(board, item)),
                _ => None,
            }
        };
        if let Some(batch) = batch {
            self.execute(board, item, batch).await;
        }
    }

    async fn execute(&self, board: BoardId, item: ItemId, batch: PendingBatch) {
        debug!(
            %board,
            %item,
            columns = batch.columns.len(),
            "issuing multi-column deep query"
        );
        let result = race_cancel(
            &self.cancel,
            self.client.item_columns(board, item, &batch.columns),
        )
        .await;
        match result {
            Ok(values) => {
                for (column, tx) in batch.waiters {
                    let _ = tx.send(Ok(values.get(&column).cloned()));
                }
            }
            Err(error) => {
                for (_, tx) in batch.waiters {
                    let _ = tx.send(Err(error.clone()));
                }
            }
        }
    }
}
