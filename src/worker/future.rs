// src/worker/future.rs

//! Single-shot result channel between a submitter and the worker thread.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Sending half, owned by the worker state while a batch is in flight.
pub(crate) type Promise = oneshot::Sender<bool>;

/// Result of a submitted task batch.
///
/// Resolves to `Some(true)` if every task succeeded, `Some(false)` if any
/// task failed, the batch was rejected, or the worker shut down first.
/// `None` means the promise was dropped without a value, which breaks the
/// worker's delivery guarantee.
#[derive(Debug)]
pub struct WorkerFuture {
    rx: oneshot::Receiver<bool>,
}

impl WorkerFuture {
    pub(crate) fn pending() -> (Promise, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// A future that is already resolved to `value`.
    pub fn resolved(value: bool) -> Self {
        let (tx, rx) = oneshot::channel();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(value);
        Self { rx }
    }

    /// Block the calling thread until the result is available.
    ///
    /// Must not be called from inside an async task; await the future there.
    pub fn get(self) -> Option<bool> {
        self.rx.blocking_recv().ok()
    }

    /// Non-blocking peek. `None` while the batch is still running.
    pub fn try_get(&mut self) -> Option<bool> {
        self.rx.try_recv().ok()
    }
}

impl Future for WorkerFuture {
    type Output = Option<bool>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(Result::ok)
    }
}
