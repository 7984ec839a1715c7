//! Host primitives consumed by the runtime layer.
//!
//! The runtime never owns an event loop. It asks the host for a callback at the
//! next frame, at idle time, or after a delay, and everything it does happens
//! inside those callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One-shot callback handed to the host.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Callback invoked on every tick of a recurring timer.
pub type RepeatingCallback = Box<dyn FnMut() + Send + 'static>;

/// Host "next frame" primitive.
pub trait FrameHost: Send + Sync {
    /// Run `callback` once, when the host prepares its next frame.
    fn request_frame(&self, callback: Callback);
}

/// Host "idle" primitive.
pub trait IdleHost: Send + Sync {
    /// Run `callback` once the host reports spare capacity.
    ///
    /// # Errors
    ///
    /// Hands `callback` back untouched when the host has no idle primitive, so
    /// the caller can fall back to a zero-delay timer.
    fn request_idle(&self, callback: Callback) -> Result<(), Callback>;
}

/// Host timer primitive.
pub trait TimerHost: Send + Sync {
    /// Run `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerHandle;

    /// Run `callback` every `period`, first after one full period.
    fn set_interval(&self, period: Duration, callback: RepeatingCallback) -> TimerHandle;
}

/// Cancellation handle for a timer registered with a [`TimerHost`].
///
/// Cancelling is idempotent and cancelling a one-shot timer that already fired
/// does nothing.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<tokio::task::AbortHandle>,
}

impl TimerHandle {
    /// Create a handle around a shared cancellation flag.
    #[must_use]
    pub fn new(cancelled: Arc<AtomicBool>) -> Self {
        Self {
            cancelled,
            abort: None,
        }
    }

    /// Also abort `abort` when the timer is cancelled.
    #[must_use]
    pub fn with_abort(mut self, abort: tokio::task::AbortHandle) -> Self {
        self.abort = Some(abort);
        self
    }

    /// Stop the timer from firing again.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl<H: FrameHost + ?Sized> FrameHost for Arc<H> {
    fn request_frame(&self, callback: Callback) {
        (**self).request_frame(callback);
    }
}

impl<H: IdleHost + ?Sized> IdleHost for Arc<H> {
    fn request_idle(&self, callback: Callback) -> Result<(), Callback> {
        (**self).request_idle(callback)
    }
}

impl<H: TimerHost + ?Sized> TimerHost for Arc<H> {
    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerHandle {
        (**self).set_timeout(delay, callback)
    }

    fn set_interval(&self, period: Duration, callback: RepeatingCallback) -> TimerHandle {
        (**self).set_interval(period, callback)
    }
}
