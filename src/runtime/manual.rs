//! Explicitly driven host with a virtual clock.
//!
//! `ManualHost` is for embedders that own their render loop (they call
//! [`ManualHost::drain_frame`] once per painted frame) and for deterministic
//! tests. No callback ever runs while the host's internal lock is held, so
//! callbacks may freely request more frames, idle slots, or timers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::util::clock::{Clock, ManualClock};

use super::host::{Callback, FrameHost, IdleHost, RepeatingCallback, TimerHandle, TimerHost};

enum TimerCallback {
    Once(Callback),
    Repeat(RepeatingCallback),
}

struct ManualTimer {
    seq: u64,
    due: Duration,
    period: Option<Duration>,
    cancelled: Arc<AtomicBool>,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualState {
    frames: Vec<Callback>,
    idle: VecDeque<Callback>,
    timers: Vec<ManualTimer>,
    next_seq: u64,
}

/// Host whose frames, idle slots, and timers advance only when told to.
#[derive(Clone)]
pub struct ManualHost {
    state: Arc<Mutex<ManualState>>,
    clock: ManualClock,
    idle_supported: bool,
}

impl Default for ManualHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualHost {
    /// Create a host with frame, idle, and timer support.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState::default())),
            clock: ManualClock::new(),
            idle_supported: true,
        }
    }

    /// Create a host that has no idle primitive.
    #[must_use]
    pub fn without_idle() -> Self {
        Self {
            idle_supported: false,
            ..Self::new()
        }
    }

    /// Virtual clock driven by [`advance`](Self::advance).
    #[must_use]
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Frame callbacks waiting for the next [`drain_frame`](Self::drain_frame).
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.state.lock().frames.len()
    }

    /// Idle callbacks waiting for the next [`run_idle`](Self::run_idle).
    #[must_use]
    pub fn pending_idle(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Timers that are neither cancelled nor fired.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state
            .lock()
            .timers
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::Acquire))
            .count()
    }

    /// Run the frame callbacks requested before this call and return how many ran.
    ///
    /// Frames requested while draining are deferred to the next drain.
    pub fn drain_frame(&self) -> usize {
        let frames = std::mem::take(&mut self.state.lock().frames);
        let count = frames.len();
        for callback in frames {
            callback();
        }
        trace!(count, "manual host drained frame");
        count
    }

    /// Run the idle callbacks requested before this call and return how many ran.
    pub fn run_idle(&self) -> usize {
        let idle = std::mem::take(&mut self.state.lock().idle);
        let count = idle.len();
        for callback in idle {
            callback();
        }
        count
    }

    /// Move the virtual clock forward by `by`, firing due timers in deadline order.
    ///
    /// Returns the number of timer callbacks that ran. Timers scheduled by a
    /// firing callback run in the same call if they fall due before the target.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.clock.now() + by;
        let mut fired = 0;
        while let Some(timer) = self.take_next_due(target) {
            self.clock.set(timer.due);
            match timer.callback {
                TimerCallback::Once(callback) => callback(),
                TimerCallback::Repeat(mut callback) => {
                    callback();
                    let period = timer.period.unwrap_or(Duration::ZERO);
                    if !timer.cancelled.load(Ordering::Acquire) && !period.is_zero() {
                        self.state.lock().timers.push(ManualTimer {
                            seq: timer.seq,
                            due: timer.due + period,
                            period: timer.period,
                            cancelled: timer.cancelled,
                            callback: TimerCallback::Repeat(callback),
                        });
                    }
                }
            }
            fired += 1;
        }
        self.clock.set(target);
        fired
    }

    fn take_next_due(&self, target: Duration) -> Option<ManualTimer> {
        let mut state = self.state.lock();
        state
            .timers
            .retain(|t| !t.cancelled.load(Ordering::Acquire));
        let index = state
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= target)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(i, _)| i)?;
        Some(state.timers.swap_remove(index))
    }

    fn push_timer(
        &self,
        delay: Duration,
        period: Option<Duration>,
        callback: TimerCallback,
    ) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.timers.push(ManualTimer {
            seq,
            due: self.clock.now() + delay,
            period,
            cancelled: Arc::clone(&cancelled),
            callback,
        });
        TimerHandle::new(cancelled)
    }
}

impl FrameHost for ManualHost {
    fn request_frame(&self, callback: Callback) {
        self.state.lock().frames.push(callback);
    }
}

impl IdleHost for ManualHost {
    fn request_idle(&self, callback: Callback) -> Result<(), Callback> {
        if !self.idle_supported {
            return Err(callback);
        }
        self.state.lock().idle.push_back(callback);
        Ok(())
    }
}

impl TimerHost for ManualHost {
    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerHandle {
        self.push_timer(delay, None, TimerCallback::Once(callback))
    }

    fn set_interval(&self, period: Duration, callback: RepeatingCallback) -> TimerHandle {
        self.push_timer(period, Some(period), TimerCallback::Repeat(callback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&count);
        let make = move || -> Callback {
            let c = Arc::clone(&shared);
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    #[test]
    fn test_frames_requested_during_drain_wait() {
        let host = ManualHost::new();
        let inner_host = host.clone();
        host.request_frame(Box::new(move || {
            inner_host.request_frame(Box::new(|| {}));
        }));
        assert_eq!(host.drain_frame(), 1);
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.drain_frame(), 1);
        assert_eq!(host.drain_frame(), 0);
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let host = ManualHost::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for (delay, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let order = Arc::clone(&order);
            let _ = host.set_timeout(
                Duration::from_millis(delay),
                Box::new(move || order.lock().push(label)),
            );
        }
        assert_eq!(host.advance(Duration::from_millis(25)), 2);
        assert_eq!(*order.lock(), vec!["a", "b"]);
        assert_eq!(host.advance(Duration::from_millis(5)), 1);
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
        assert_eq!(host.clock().now(), Duration::from_millis(30));
    }

    #[test]
    fn test_interval_rearms_until_cancelled() {
        let host = ManualHost::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handle = host.set_interval(
            Duration::from_millis(10),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        host.advance(Duration::from_millis(35));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        handle.cancel();
        host.advance(Duration::from_millis(100));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_cancelled_timeout_never_fires() {
        let host = ManualHost::new();
        let (count, make) = counter();
        let handle = host.set_timeout(Duration::from_millis(5), make());
        handle.cancel();
        assert_eq!(host.advance(Duration::from_millis(10)), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_without_idle_hands_callback_back() {
        let host = ManualHost::without_idle();
        assert!(host.request_idle(Box::new(|| {})).is_err());
        assert_eq!(host.pending_idle(), 0);

        let supported = ManualHost::new();
        let (count, make) = counter();
        assert!(supported.request_idle(make()).is_ok());
        assert_eq!(supported.run_idle(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
