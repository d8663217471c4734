//! Request Serializer
//!
//! A strict FIFO, single-concurrency queue for session requests. The game
//! server cannot safely process two concurrent turns for one session (its
//! scene generators are single-cursor), so every `play` call funnels through
//! this queue: at most one task is in flight at any instant, and the next
//! task starts only after the previous one settles — success or failure.
//!
//! A task's failure is confined to its own handle; the queue advances
//! regardless.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::Future;
use tokio::sync::{mpsc, oneshot};

use crate::error::EngineError;

/// Handle to a queued task's eventual outcome
///
/// Resolves with the task's own result once the task has run. Fails with
/// [`EngineError::QueueClosed`] only if the queue shut down before the task
/// ran — never because of another task's failure.
pub struct QueueHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> QueueHandle<T> {
    /// Wait for the task to settle
    pub async fn settled(self) -> Result<T, EngineError> {
        self.rx.await.map_err(|_| EngineError::QueueClosed)
    }
}

/// FIFO single-concurrency task queue
///
/// Tasks run on a dedicated worker in strict enqueue order. Dropping the
/// queue lets the worker finish the tasks already queued, then exit.
pub struct RequestQueue {
    tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
    pending: Arc<AtomicUsize>,
    processing: Arc<AtomicBool>,
}

impl RequestQueue {
    /// Create a new queue and spawn its worker
    #[must_use]
    pub fn new() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();
        let pending = Arc::new(AtomicUsize::new(0));
        let processing = Arc::new(AtomicBool::new(false));

        let worker_pending = Arc::clone(&pending);
        let worker_processing = Arc::clone(&processing);
        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                worker_pending.fetch_sub(1, Ordering::SeqCst);
                worker_processing.store(true, Ordering::SeqCst);
                task.await;
                worker_processing.store(false, Ordering::SeqCst);
            }
            tracing::debug!("Request queue worker exiting");
        });

        Self {
            tx,
            pending,
            processing,
        }
    }

    /// Append a task and return a handle to its outcome
    ///
    /// The task starts only after every previously queued task has settled.
    /// Queue mechanics never fail the handle; only queue shutdown does.
    pub fn enqueue<T, F>(&self, task: F) -> QueueHandle<T>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        self.pending.fetch_add(1, Ordering::SeqCst);
        let boxed: BoxFuture<'static, ()> = Box::pin(async move {
            let outcome = task.await;
            // Caller may have given up on the handle; that's fine
            let _ = done_tx.send(outcome);
        });

        if self.tx.send(boxed).is_err() {
            // Worker is gone; dropping the boxed task drops done_tx and the
            // handle resolves as QueueClosed
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }

        QueueHandle { rx: done_rx }
    }

    /// Number of tasks waiting to start
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether a task is in flight right now
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}
