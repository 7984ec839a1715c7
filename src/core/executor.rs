//! Bounded-concurrency FIFO executor.
//!
//! Jobs wait in submission order and start as soon as fewer than
//! `concurrency` jobs are in flight. Each completion releases its slot and
//! re-runs dispatch, the same wake-next loop a capacity-limited pool uses.
//! There is no cancellation: a timeout belongs inside the submitted task.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, error};

use super::error::{panic_message, AppResult, RuntimeError};
use super::worker_pool::{PoolCounters, PoolStats};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn an async task that returns a future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// How a job left the running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job resolved successfully.
    Completed,
    /// The job returned an error or panicked.
    Failed,
}

/// A deferred asynchronous operation waiting for a free slot.
pub type QueuedJob = Box<dyn FnOnce() -> BoxFuture<'static, JobOutcome> + Send + 'static>;

struct ExecState {
    waiting: VecDeque<QueuedJob>,
    active: usize,
}

struct ExecutorInner<S> {
    concurrency: usize,
    state: Mutex<ExecState>,
    counters: PoolCounters,
    idle: Notify,
    spawner: S,
}

/// Runs at most `concurrency` jobs at once, starting waiting jobs in FIFO order.
///
/// Cloning yields another handle to the same executor.
pub struct BoundedExecutor<S> {
    inner: Arc<ExecutorInner<S>>,
}

impl<S> Clone for BoundedExecutor<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> BoundedExecutor<S>
where
    S: Spawn + Send + Sync + 'static,
{
    /// Create an executor that runs at most `concurrency` jobs at once.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` when `concurrency` is zero.
    pub fn new(concurrency: usize, spawner: S) -> Result<Self, RuntimeError> {
        if concurrency == 0 {
            return Err(RuntimeError::InvalidConfig(
                "concurrency must be greater than 0".into(),
            ));
        }
        Ok(Self {
            inner: Arc::new(ExecutorInner {
                concurrency,
                state: Mutex::new(ExecState {
                    waiting: VecDeque::new(),
                    active: 0,
                }),
                counters: PoolCounters::default(),
                idle: Notify::new(),
                spawner,
            }),
        })
    }

    /// Enqueue `task`. A failing or panicking task is logged and counted; it
    /// never stops the jobs behind it.
    pub fn add<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.enqueue(Box::new(move || {
            async move {
                match AssertUnwindSafe(async move { task().await })
                    .catch_unwind()
                    .await
                {
                    Ok(Ok(())) => JobOutcome::Completed,
                    Ok(Err(err)) => {
                        error!(error = %err, "executor job failed");
                        JobOutcome::Failed
                    }
                    Err(payload) => {
                        error!(panic = %panic_message(payload.as_ref()), "executor job panicked");
                        JobOutcome::Failed
                    }
                }
            }
            .boxed()
        }));
    }

    /// Enqueue a prepared job and dispatch it if a slot is free.
    ///
    /// A job that panics counts as failed and still releases its slot.
    pub fn enqueue(&self, job: QueuedJob) {
        self.inner.state.lock().waiting.push_back(job);
        self.inner.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        self.inner.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);
        ExecutorInner::dispatch(&self.inner);
    }

    /// Jobs currently running.
    #[must_use]
    pub fn active(&self) -> usize {
        self.inner.state.lock().active
    }

    /// Jobs waiting for a slot.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.inner.state.lock().waiting.len()
    }

    /// Maximum number of jobs running at once.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    /// Snapshot of executor statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.inner.counters.snapshot(self.inner.concurrency)
    }

    /// Resolve once no job is running or waiting.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            {
                let state = self.inner.state.lock();
                if state.active == 0 && state.waiting.is_empty() {
                    return;
                }
            }
            notified.await;
        }
    }
}

impl<S> ExecutorInner<S>
where
    S: Spawn + Send + Sync + 'static,
{
    fn dispatch(inner: &Arc<Self>) {
        loop {
            let job = {
                let mut state = inner.state.lock();
                if state.active >= inner.concurrency {
                    break;
                }
                let Some(job) = state.waiting.pop_front() else {
                    break;
                };
                state.active += 1;
                job
            };
            inner.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
            inner.counters.active_tasks.fetch_add(1, Ordering::Relaxed);
            debug!(concurrency = inner.concurrency, "executor starting job");

            let this = Arc::clone(inner);
            inner.spawner.spawn(async move {
                let outcome = match AssertUnwindSafe(async move { job().await })
                    .catch_unwind()
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(payload) => {
                        error!(panic = %panic_message(payload.as_ref()), "executor job panicked");
                        JobOutcome::Failed
                    }
                };
                Self::on_job_finished(&this, outcome);
            });
        }
    }

    fn on_job_finished(inner: &Arc<Self>, outcome: JobOutcome) {
        inner.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
        match outcome {
            JobOutcome::Completed => {
                inner.counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            JobOutcome::Failed => {
                inner.counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
            }
        }

        let drained = {
            let mut state = inner.state.lock();
            state.active -= 1;
            state.active == 0 && state.waiting.is_empty()
        };
        if drained {
            debug!("executor drained");
            inner.idle.notify_waiters();
        }

        Self::dispatch(inner);
    }
}
