//! Render-update batcher.
//!
//! Many cheap update requests made during one frame are coalesced into a
//! single flush at the host's next frame. The pending list is swapped out
//! before any update runs, so an update that schedules another update defers
//! it to the following frame instead of growing the current flush.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::runtime::host::FrameHost;

use super::error::{panic_message, AppResult};

type Update = Box<dyn FnOnce() -> AppResult<()> + Send + 'static>;

/// Counters describing batcher activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatcherStats {
    /// Flushes performed.
    pub frames_flushed: u64,
    /// Updates that ran without failing.
    pub updates_run: u64,
    /// Updates that returned an error or panicked.
    pub updates_failed: u64,
}

struct BatchState {
    pending: Vec<Update>,
    flush_scheduled: bool,
    stats: BatcherStats,
}

struct BatcherInner {
    state: Mutex<BatchState>,
    host: Arc<dyn FrameHost>,
}

/// Coalesces update requests into one flush per frame.
///
/// Construct one per application (or per test) and share it by cloning.
#[derive(Clone)]
pub struct UpdateBatcher {
    inner: Arc<BatcherInner>,
}

impl UpdateBatcher {
    /// Create a batcher that flushes on `host` frames.
    pub fn new(host: Arc<dyn FrameHost>) -> Self {
        Self {
            inner: Arc::new(BatcherInner {
                state: Mutex::new(BatchState {
                    pending: Vec::new(),
                    flush_scheduled: false,
                    stats: BatcherStats::default(),
                }),
                host,
            }),
        }
    }

    /// Run `update` at the next flush.
    pub fn schedule<F>(&self, update: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_fallible(move || {
            update();
            Ok(())
        });
    }

    /// Run a fallible `update` at the next flush. An error is logged and the
    /// rest of the flush continues.
    pub fn schedule_fallible<F>(&self, update: F)
    where
        F: FnOnce() -> AppResult<()> + Send + 'static,
    {
        let request = {
            let mut state = self.inner.state.lock();
            state.pending.push(Box::new(update));
            !std::mem::replace(&mut state.flush_scheduled, true)
        };
        if request {
            let inner = Arc::clone(&self.inner);
            self.inner
                .host
                .request_frame(Box::new(move || BatcherInner::flush(&inner)));
        }
    }

    /// Updates waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Whether a frame has been requested for the pending updates.
    #[must_use]
    pub fn is_flush_scheduled(&self) -> bool {
        self.inner.state.lock().flush_scheduled
    }

    /// Snapshot of batcher counters.
    #[must_use]
    pub fn stats(&self) -> BatcherStats {
        self.inner.state.lock().stats
    }
}

impl BatcherInner {
    fn flush(inner: &Arc<Self>) {
        let batch = {
            let mut state = inner.state.lock();
            state.flush_scheduled = false;
            std::mem::take(&mut state.pending)
        };
        debug!(updates = batch.len(), "flushing update batch");

        let mut run = 0;
        let mut failed = 0;
        for update in batch {
            match catch_unwind(AssertUnwindSafe(update)) {
                Ok(Ok(())) => run += 1,
                Ok(Err(err)) => {
                    failed += 1;
                    error!(error = %err, "batched update failed");
                }
                Err(payload) => {
                    failed += 1;
                    error!(panic = %panic_message(payload.as_ref()), "batched update panicked");
                }
            }
        }

        let mut state = inner.state.lock();
        state.stats.frames_flushed += 1;
        state.stats.updates_run += run;
        state.stats.updates_failed += failed;
    }
}
