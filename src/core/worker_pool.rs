//! Concurrency pool with per-submission result handles.
//!
//! `ConcurrencyPool` shares the executor's dispatch discipline (at most
//! `max_concurrency` in flight, FIFO among waiting tasks) and adds:
//!
//! - **Per-call handles**: every `submit` returns a [`TaskHandle`] that resolves
//!   with that task's own value or error, independent of other submissions
//! - **Results log**: every successful value is also appended to an internal log
//!
//! The log is unbounded; callers that submit indefinitely are expected to
//! drain it with [`ConcurrencyPool::take_results`] or
//! [`ConcurrencyPool::clear_results`].
//!
//! # Example
//!
//! ```rust,ignore
//! use frameloop::core::ConcurrencyPool;
//! use frameloop::runtime::TokioHost;
//!
//! let pool = ConcurrencyPool::new(4, TokioHost::current()?)?;
//! let handle = pool.submit(|| async { fetch_leaderboard().await });
//! let board = handle.await?;
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::warn;

use super::error::{panic_message, AppResult, RuntimeError};
use super::executor::{BoundedExecutor, JobOutcome, Spawn};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Maximum jobs running at once.
    pub concurrency: usize,

    /// Currently executing jobs.
    pub active_tasks: u64,

    /// Jobs waiting for a slot.
    pub queued_tasks: u64,

    /// Total jobs completed successfully.
    pub completed_tasks: u64,

    /// Total jobs that failed or panicked.
    pub failed_tasks: u64,

    /// Total jobs submitted.
    pub submitted_tasks: u64,
}

/// Internal counters for pool statistics.
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub queued_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, concurrency: usize) -> PoolStats {
        PoolStats {
            concurrency,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
        }
    }
}

/// Future resolving with one submitted task's result.
#[must_use = "a TaskHandle does nothing unless awaited"]
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<AppResult<T>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = AppResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RuntimeError::HandleDropped.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Bounded pool that hands back a result handle per submission.
pub struct ConcurrencyPool<T, S> {
    executor: BoundedExecutor<S>,
    results: Arc<Mutex<Vec<T>>>,
}

impl<T, S> Clone for ConcurrencyPool<T, S> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            results: Arc::clone(&self.results),
        }
    }
}

impl<T, S> ConcurrencyPool<T, S>
where
    T: Clone + Send + 'static,
    S: Spawn + Send + Sync + 'static,
{
    /// Create a pool running at most `max_concurrency` tasks at once.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` when `max_concurrency` is zero.
    pub fn new(max_concurrency: usize, spawner: S) -> Result<Self, RuntimeError> {
        Ok(Self {
            executor: BoundedExecutor::new(max_concurrency, spawner)?,
            results: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Submit `task` and return a handle to its own result.
    ///
    /// A panic inside the task resolves only this handle, with
    /// `RuntimeError::TaskPanicked`.
    pub fn submit<F, Fut>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let results = Arc::clone(&self.results);
        self.executor.enqueue(Box::new(move || {
            async move {
                let result = match AssertUnwindSafe(async move { task().await })
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(payload) => {
                        Err(RuntimeError::TaskPanicked(panic_message(payload.as_ref())).into())
                    }
                };
                let outcome = match &result {
                    Ok(value) => {
                        results.lock().push(value.clone());
                        JobOutcome::Completed
                    }
                    Err(err) => {
                        warn!(error = %err, "pool task failed");
                        JobOutcome::Failed
                    }
                };
                if tx.send(result).is_err() {
                    warn!("pool task finished after its handle was dropped");
                }
                outcome
            }
            .boxed()
        }));
        TaskHandle { rx }
    }

    /// Copy of every successful value, in completion order.
    #[must_use]
    pub fn results(&self) -> Vec<T> {
        self.results.lock().clone()
    }

    /// Drain the results log.
    pub fn take_results(&self) -> Vec<T> {
        std::mem::take(&mut *self.results.lock())
    }

    /// Empty the results log.
    pub fn clear_results(&self) {
        self.results.lock().clear();
    }

    /// Tasks currently running.
    #[must_use]
    pub fn active(&self) -> usize {
        self.executor.active()
    }

    /// Tasks waiting for a slot.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.executor.waiting()
    }

    /// Snapshot of pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.executor.stats()
    }

    /// Resolve once no task is running or waiting.
    pub async fn wait_idle(&self) {
        self.executor.wait_idle().await;
    }
}
