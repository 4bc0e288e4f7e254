use formula_resolver_model::{ResolveError, ResolveResult};
use std::future::Future;
use tokio::sync::watch;

/// Caller-side handle that cancels a session's outstanding work.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Creates a connected handle/signal pair.
    pub fn new() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx, _never: None })
    }

    /// Cancels every resolve and pending coordinator batch observing the
    /// paired signal.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The cancellation signal threaded into every remote call a session makes.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
    /// Keeps the sender of a never-signal alive so `changed` stays pending.
    _never: Option<std::sync::Arc<watch::Sender<bool>>>,
}

impl CancelSignal {
    /// A signal that never fires, for sessions without a cancellation option.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _never: Some(std::sync::Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when the paired handle cancels. Pends forever on a
    /// never-signal or when the handle is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Like [CancelSignal::cancelled], but returns `false` once the handle is
    /// gone and cancellation has become impossible. Lets watcher tasks exit
    /// instead of pending forever.
    pub(crate) async fn fired(&self) -> bool {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return true;
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }
}

/// Races a client call against the cancellation signal, mapping client errors
/// into [ResolveError::Remote].
pub(crate) async fn race_cancel<T>(
    cancel: &CancelSignal,
    fut: impl Future<Output = Result<T, crate::client::ClientError>>,
) -> ResolveResult<T> {
    if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }
    tokio::select! {
        () = cancel.cancelled() => Err(ResolveError::Cancelled),
        result = fut => result.map_err(ResolveError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_fires_the_signal() {
        let (handle, signal) = CancelHandle::new();
        assert!(!signal.is_cancelled());
        handle.cancel();
        assert!(signal.is_cancelled());
        signal.cancelled().await;
    }

    #[tokio::test]
    async fn race_prefers_completed_work() {
        let (_handle, signal) = CancelHandle::new();
        let result = race_cancel(&signal, async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn race_rejects_after_cancellation() {
        let (handle, signal) = CancelHandle::new();
        handle.cancel();
        let result = race_cancel(&signal, async { Ok(42) }).await;
        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }
}
