//! Tokio-backed host implementation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::{RuntimeError, Spawn};

use super::host::{Callback, FrameHost, IdleHost, RepeatingCallback, TimerHandle, TimerHost};

/// Default frame interval (~60 fps).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Host that maps every primitive onto a tokio runtime.
///
/// Frames are a sleep of `frame_interval`, idle callbacks run after the task
/// yields back to the scheduler, and timers are spawned sleeps.
#[derive(Clone, Debug)]
pub struct TokioHost {
    handle: tokio::runtime::Handle,
    frame_interval: Duration,
}

impl TokioHost {
    /// Create a host from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self {
            handle,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    /// Create a host bound to the runtime of the calling thread.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::NoRuntime` outside a tokio runtime.
    pub fn current() -> Result<Self, RuntimeError> {
        tokio::runtime::Handle::try_current()
            .map(Self::new)
            .map_err(|_| RuntimeError::NoRuntime)
    }

    /// Override the delay between a frame request and its callback.
    #[must_use]
    pub const fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Delay between a frame request and its callback.
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

impl Spawn for TokioHost {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(fut);
    }
}

impl FrameHost for TokioHost {
    fn request_frame(&self, callback: Callback) {
        let frame_interval = self.frame_interval;
        self.handle.spawn(async move {
            tokio::time::sleep(frame_interval).await;
            callback();
        });
    }
}

impl IdleHost for TokioHost {
    fn request_idle(&self, callback: Callback) -> Result<(), Callback> {
        self.handle.spawn(async move {
            tokio::task::yield_now().await;
            callback();
        });
        Ok(())
    }
}

impl TimerHost for TokioHost {
    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::Acquire) {
                callback();
            }
        });
        TimerHandle::new(cancelled).with_abort(task.abort_handle())
    }

    fn set_interval(&self, period: Duration, mut callback: RepeatingCallback) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let task = self.handle.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                callback();
            }
        });
        TimerHandle::new(cancelled).with_abort(task.abort_handle())
    }
}
