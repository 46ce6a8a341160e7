//! Bounded fire-and-forget job queue for work that must stay off the hot path.
//!
//! Status notifications and transcript flushes are submitted here by the
//! PTY reader while it holds a component lock. Submission never waits: when
//! the queue is full the job is dropped and a warning is logged.

use crate::{Result, TermwatchError};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

/// Default number of queued jobs before new submissions are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

type Job = Box<dyn FnOnce() + Send + 'static>;

static GLOBAL: Lazy<Dispatcher> = Lazy::new(|| Dispatcher::new(DEFAULT_QUEUE_CAPACITY));

/// Handle to a single worker thread draining a bounded FIFO of jobs.
///
/// Clones share the same queue. Jobs run in submission order, one at a time;
/// the worker exits once every handle has been dropped.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Job>,
    dropped: Arc<AtomicU64>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("capacity", &self.tx.max_capacity())
            .field("dropped", &self.dropped_jobs())
            .finish()
    }
}

impl Dispatcher {
    /// Start a dispatcher with its own worker thread.
    pub fn new(capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity.max(1));

        let spawned = std::thread::Builder::new()
            .name("termwatch-dispatch".into())
            .spawn(move || {
                debug!(target: "termwatch::dispatch", "Dispatch worker started");
                while let Some(job) = rx.blocking_recv() {
                    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)).is_err() {
                        error!(target: "termwatch::dispatch", "Dispatched job panicked");
                    }
                }
                debug!(target: "termwatch::dispatch", "Dispatch worker stopped");
            });
        if let Err(e) = spawned {
            // The receiver went down with the closure; every submit will now
            // report the queue as closed.
            error!(target: "termwatch::dispatch", "Failed to spawn dispatch worker: {}", e);
        }

        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The process-wide dispatcher shared by sessions that don't bring their own.
    pub fn global() -> Self {
        GLOBAL.clone()
    }

    /// Queue a job without blocking. Returns `false` if it was dropped.
    pub fn submit<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.tx.try_send(Box::new(job)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    target: "termwatch::dispatch",
                    dropped,
                    "Dispatch queue full, dropping job"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                error!(target: "termwatch::dispatch", "Dispatch worker is gone, dropping job");
                false
            }
        }
    }

    /// Wait until every job submitted before this call has run.
    pub async fn settle(&self) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(Box::new(move || {
                let _ = done_tx.send(());
            }))
            .await
            .map_err(|_| TermwatchError::DispatcherClosed)?;
        done_rx.await.map_err(|_| TermwatchError::DispatcherClosed)
    }

    /// Number of jobs dropped because the queue was full or closed.
    pub fn dropped_jobs(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
