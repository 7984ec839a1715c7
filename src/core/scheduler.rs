//! Priority scheduler for ranked one-shot work.
//!
//! The scheduler is either idle or running. Adding work to an idle scheduler
//! requests one continuation from the host; each continuation runs exactly one
//! task (the highest priority, earliest added) and then either requests the
//! next continuation or returns to idle. A dequeued task always runs to
//! completion and is never cancelled.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::infra::queue::PriorityQueue;
use crate::runtime::host::{Callback, IdleHost, TimerHost};

use super::error::{panic_message, AppResult};

/// Rank of a scheduled task. Larger values run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Priority(pub i32);

impl Priority {
    /// Background work such as analytics recomputation.
    pub const LOW: Self = Self(0);
    /// Default rank.
    pub const NORMAL: Self = Self(50);
    /// Work the user is about to see, such as visible-content prefetch.
    pub const HIGH: Self = Self(100);
}

impl Default for Priority {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

/// Counters describing scheduler activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks that ran to completion without failing.
    pub completed: u64,
    /// Tasks that returned an error or panicked.
    pub failed: u64,
    /// Continuations that went through the timer fallback.
    pub timer_fallbacks: u64,
}

type Action = Box<dyn FnOnce() -> AppResult<()> + Send + 'static>;

struct SchedState {
    queue: PriorityQueue<Action>,
    running: bool,
    stats: SchedulerStats,
}

struct SchedulerInner {
    state: Mutex<SchedState>,
    idle: Arc<dyn IdleHost>,
    timers: Arc<dyn TimerHost>,
}

/// Serializes prioritized one-shot work over host idle callbacks.
#[derive(Clone)]
pub struct PriorityScheduler {
    inner: Arc<SchedulerInner>,
}

impl PriorityScheduler {
    /// Create a scheduler that continues on `idle`, falling back to zero-delay
    /// timers from `timers` when the host has no idle primitive.
    pub fn new(idle: Arc<dyn IdleHost>, timers: Arc<dyn TimerHost>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                state: Mutex::new(SchedState {
                    queue: PriorityQueue::new(),
                    running: false,
                    stats: SchedulerStats::default(),
                }),
                idle,
                timers,
            }),
        }
    }

    /// Queue `action` at `priority`.
    pub fn add<F>(&self, action: F, priority: impl Into<Priority>)
    where
        F: FnOnce() + Send + 'static,
    {
        self.add_fallible(
            move || {
                action();
                Ok(())
            },
            priority,
        );
    }

    /// Queue a fallible `action` at `priority`. An error is logged and the
    /// remaining queue keeps running.
    pub fn add_fallible<F>(&self, action: F, priority: impl Into<Priority>)
    where
        F: FnOnce() -> AppResult<()> + Send + 'static,
    {
        let priority = priority.into();
        let start = {
            let mut state = self.inner.state.lock();
            state.queue.push(priority.0, Box::new(action));
            !std::mem::replace(&mut state.running, true)
        };
        if start {
            debug!(priority = priority.0, "scheduler leaving idle");
            SchedulerInner::request_continuation(&self.inner);
        }
    }

    /// Tasks waiting to run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Whether no task is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().queue.is_empty()
    }

    /// Whether a continuation is outstanding.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Snapshot of scheduler counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.inner.state.lock().stats
    }
}

impl SchedulerInner {
    fn request_continuation(inner: &Arc<Self>) {
        let this = Arc::clone(inner);
        let continuation: Callback = Box::new(move || Self::run_next(&this));
        if let Err(continuation) = inner.idle.request_idle(continuation) {
            warn!("idle callback unavailable, continuing on a zero-delay timer");
            inner.state.lock().stats.timer_fallbacks += 1;
            let _ = inner.timers.set_timeout(Duration::ZERO, continuation);
        }
    }

    fn run_next(inner: &Arc<Self>) {
        let next = inner.state.lock().queue.pop();
        let Some(action) = next else {
            inner.state.lock().running = false;
            return;
        };

        let failed = match catch_unwind(AssertUnwindSafe(action)) {
            Ok(Ok(())) => false,
            Ok(Err(err)) => {
                error!(error = %err, "scheduled task failed");
                true
            }
            Err(payload) => {
                error!(panic = %panic_message(payload.as_ref()), "scheduled task panicked");
                true
            }
        };

        let more = {
            let mut state = inner.state.lock();
            if failed {
                state.stats.failed += 1;
            } else {
                state.stats.completed += 1;
            }
            state.running = !state.queue.is_empty();
            state.running
        };
        if more {
            Self::request_continuation(inner);
        } else {
            debug!("scheduler idle");
        }
    }
}
