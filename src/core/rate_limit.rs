//! Debounce and throttle wrappers.
//!
//! The two policies are complementary. A debounced callable runs only the
//! last call of a burst, `delay` after that call. A throttled callable runs
//! the first call of each `limit` window immediately and drops the rest of
//! the window's calls along with their arguments.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::runtime::host::{TimerHandle, TimerHost};
use crate::util::clock::Clock;

use super::error::RuntimeError;

struct DebounceState {
    generation: u64,
    pending: Option<TimerHandle>,
}

/// Callable that runs only the final call of each burst.
pub struct Debounced<A> {
    func: Arc<dyn Fn(A) + Send + Sync + 'static>,
    delay: Duration,
    timers: Arc<dyn TimerHost>,
    state: Arc<Mutex<DebounceState>>,
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            delay: self.delay,
            timers: Arc::clone(&self.timers),
            state: Arc::clone(&self.state),
        }
    }
}

/// Wrap `func` so that it runs `delay` after the last of a burst of calls,
/// with that call's arguments.
///
/// # Errors
///
/// Returns `RuntimeError::InvalidConfig` when `delay` is zero.
pub fn debounce<A, F>(
    func: F,
    delay: Duration,
    timers: Arc<dyn TimerHost>,
) -> Result<Debounced<A>, RuntimeError>
where
    A: Send + 'static,
    F: Fn(A) + Send + Sync + 'static,
{
    if delay.is_zero() {
        return Err(RuntimeError::InvalidConfig(
            "debounce delay must be greater than 0".into(),
        ));
    }
    Ok(Debounced {
        func: Arc::new(func),
        delay,
        timers,
        state: Arc::new(Mutex::new(DebounceState {
            generation: 0,
            pending: None,
        })),
    })
}

impl<A: Send + 'static> Debounced<A> {
    /// Cancel any pending run and reschedule with `args`.
    pub fn call(&self, args: A) {
        let mut state = self.state.lock();
        if let Some(previous) = state.pending.take() {
            previous.cancel();
        }
        state.generation += 1;
        let generation = state.generation;

        let func = Arc::clone(&self.func);
        let slot = Arc::clone(&self.state);
        let handle = self.timers.set_timeout(
            self.delay,
            Box::new(move || {
                {
                    let mut state = slot.lock();
                    if state.generation != generation {
                        return;
                    }
                    state.pending = None;
                }
                func(args);
            }),
        );
        state.pending = Some(handle);
        trace!(generation, "debounce rescheduled");
    }

    /// Drop the pending run, if any.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        if let Some(pending) = state.pending.take() {
            pending.cancel();
        }
    }

    /// Whether a run is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }
}

/// Callable that runs at most once per window, on the window's first call.
pub struct Throttled<A, C> {
    func: Arc<dyn Fn(A) + Send + Sync + 'static>,
    limit: Duration,
    clock: C,
    window_start: Arc<Mutex<Option<Duration>>>,
}

impl<A, C: Clone> Clone for Throttled<A, C> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            limit: self.limit,
            clock: self.clock.clone(),
            window_start: Arc::clone(&self.window_start),
        }
    }
}

/// Wrap `func` so that at most one call per `limit` window runs.
///
/// # Errors
///
/// Returns `RuntimeError::InvalidConfig` when `limit` is zero.
pub fn throttle<A, F, C>(func: F, limit: Duration, clock: C) -> Result<Throttled<A, C>, RuntimeError>
where
    F: Fn(A) + Send + Sync + 'static,
    C: Clock,
{
    if limit.is_zero() {
        return Err(RuntimeError::InvalidConfig(
            "throttle limit must be greater than 0".into(),
        ));
    }
    Ok(Throttled {
        func: Arc::new(func),
        limit,
        clock,
        window_start: Arc::new(Mutex::new(None)),
    })
}

impl<A, C: Clock> Throttled<A, C> {
    /// Run `func(args)` if no window is open, opening a new one. Returns
    /// whether the call ran; a dropped call's arguments are discarded.
    pub fn call(&self, args: A) -> bool {
        let now = self.clock.now();
        {
            let mut window_start = self.window_start.lock();
            if let Some(start) = *window_start {
                if now.saturating_sub(start) < self.limit {
                    return false;
                }
            }
            *window_start = Some(now);
        }
        (self.func)(args);
        true
    }

    /// Close the current window so the next call runs immediately.
    pub fn reset(&self) {
        *self.window_start.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualHost;

    fn recorder<A: Send + 'static>() -> (Arc<Mutex<Vec<A>>>, impl Fn(A) + Send + Sync + 'static) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        (calls, move |a| sink.lock().push(a))
    }

    #[test]
    fn test_debounce_runs_last_call_once() {
        let host = ManualHost::new();
        let (calls, func) = recorder::<u32>();
        let search = debounce(func, Duration::from_millis(100), Arc::new(host.clone())).unwrap();

        for query in 1..=4 {
            search.call(query);
            host.advance(Duration::from_millis(60));
        }
        assert!(calls.lock().is_empty());
        assert!(search.is_pending());

        host.advance(Duration::from_millis(40));
        assert_eq!(*calls.lock(), vec![4]);
        assert!(!search.is_pending());

        host.advance(Duration::from_secs(1));
        assert_eq!(calls.lock().len(), 1);
    }

    #[test]
    fn test_debounce_cancel() {
        let host = ManualHost::new();
        let (calls, func) = recorder::<&'static str>();
        let save = debounce(func, Duration::from_millis(50), Arc::new(host.clone())).unwrap();
        save.call("draft");
        save.cancel();
        host.advance(Duration::from_millis(100));
        assert!(calls.lock().is_empty());
        assert!(!save.is_pending());
    }

    #[test]
    fn test_throttle_first_call_of_window() {
        let host = ManualHost::new();
        let (calls, func) = recorder::<u32>();
        let scroll = throttle(func, Duration::from_millis(100), host.clock()).unwrap();

        assert!(scroll.call(1));
        host.advance(Duration::from_millis(30));
        assert!(!scroll.call(2));
        host.advance(Duration::from_millis(69));
        assert!(!scroll.call(3));
        host.advance(Duration::from_millis(1));
        assert!(scroll.call(4));
        assert!(!scroll.call(5));

        assert_eq!(*calls.lock(), vec![1, 4]);
    }

    #[test]
    fn test_throttle_reset() {
        let host = ManualHost::new();
        let (calls, func) = recorder::<u32>();
        let tap = throttle(func, Duration::from_secs(1), host.clock()).unwrap();
        assert!(tap.call(1));
        tap.reset();
        assert!(tap.call(2));
        assert_eq!(*calls.lock(), vec![1, 2]);
    }

    #[test]
    fn test_zero_windows_rejected() {
        let host = ManualHost::new();
        assert!(debounce(|_: u8| {}, Duration::ZERO, Arc::new(host.clone())).is_err());
        assert!(throttle(|_: u8| {}, Duration::ZERO, host.clock()).is_err());
    }
}
