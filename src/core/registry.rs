//! Resource registry for timers, intervals, and observer handles.
//!
//! A component registers everything it starts and releases it all with one
//! [`ResourceRegistry::cleanup`] call when it goes away. Listeners can also be
//! registered under an event name and detached in bulk with
//! [`ResourceRegistry::remove_listeners`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::runtime::host::{TimerHandle, TimerHost};

use super::error::panic_message;

/// Handle that can be detached from whatever it observes.
pub trait Observer: Send {
    /// Stop observing. Called at most once by the registry.
    fn disconnect(&mut self);
}

impl<F> Observer for F
where
    F: FnMut() + Send,
{
    fn disconnect(&mut self) {
        self();
    }
}

/// Identifier returned for each registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

enum Resource {
    Timeout(TimerHandle),
    Interval(TimerHandle),
    Observer(Box<dyn Observer>),
}

impl Resource {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Interval(_) => "interval",
            Self::Observer(_) => "observer",
        }
    }

    fn release(self, id: ResourceId) {
        match self {
            Self::Timeout(handle) | Self::Interval(handle) => handle.cancel(),
            Self::Observer(mut observer) => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| observer.disconnect())) {
                    error!(
                        resource = id.0,
                        panic = %panic_message(payload.as_ref()),
                        "observer panicked while disconnecting"
                    );
                }
            }
        }
    }
}

struct Registered {
    id: ResourceId,
    event: Option<String>,
    resource: Resource,
}

/// Tracks timers and observers so a single call can release all of them.
///
/// Dropping the registry releases whatever is still registered. A one-shot
/// timer leaves the registry once it has fired.
pub struct ResourceRegistry {
    timers: Arc<dyn TimerHost>,
    resources: Arc<Mutex<Vec<Registered>>>,
    next_id: AtomicU64,
}

impl ResourceRegistry {
    /// Create an empty registry that starts timers on `timers`.
    pub fn new(timers: Arc<dyn TimerHost>) -> Self {
        Self {
            timers,
            resources: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start a one-shot timer owned by the registry. The entry is dropped
    /// when the timer fires.
    pub fn register_timer<F>(&self, delay: Duration, callback: F) -> ResourceId
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id();
        let fired = Arc::new(AtomicBool::new(false));
        let resources: Weak<Mutex<Vec<Registered>>> = Arc::downgrade(&self.resources);
        let flag = Arc::clone(&fired);
        let handle = self.timers.set_timeout(
            delay,
            Box::new(move || {
                flag.store(true, Ordering::SeqCst);
                if let Some(resources) = resources.upgrade() {
                    resources.lock().retain(|r| r.id != id);
                }
                callback();
            }),
        );

        // A zero-delay timer on a threaded host can fire before it is recorded.
        {
            let mut resources = self.resources.lock();
            if !fired.load(Ordering::SeqCst) {
                resources.push(Registered {
                    id,
                    event: None,
                    resource: Resource::Timeout(handle),
                });
            }
        }
        id
    }

    /// Start a recurring timer owned by the registry.
    pub fn register_interval<F>(&self, period: Duration, callback: F) -> ResourceId
    where
        F: FnMut() + Send + 'static,
    {
        let handle = self.timers.set_interval(period, Box::new(callback));
        self.insert(None, Resource::Interval(handle))
    }

    /// Take ownership of an observer handle.
    pub fn register_observer<O>(&self, observer: O) -> ResourceId
    where
        O: Observer + 'static,
    {
        self.insert(None, Resource::Observer(Box::new(observer)))
    }

    /// Take ownership of a listener attached for `event`.
    pub fn register_listener<O>(&self, event: impl Into<String>, listener: O) -> ResourceId
    where
        O: Observer + 'static,
    {
        self.insert(Some(event.into()), Resource::Observer(Box::new(listener)))
    }

    /// Detach every listener registered for `event` and return how many were detached.
    pub fn remove_listeners(&self, event: &str) -> usize {
        let removed: Vec<Registered> = {
            let mut resources = self.resources.lock();
            let (matching, kept) = std::mem::take(&mut *resources)
                .into_iter()
                .partition(|r| r.event.as_deref() == Some(event));
            *resources = kept;
            matching
        };
        let count = removed.len();
        for registered in removed {
            registered.resource.release(registered.id);
        }
        debug!(event, count, "removed listeners");
        count
    }

    /// Release one resource. Returns `false` if it was already released.
    pub fn release(&self, id: ResourceId) -> bool {
        let registered = {
            let mut resources = self.resources.lock();
            resources
                .iter()
                .position(|r| r.id == id)
                .map(|index| resources.remove(index))
        };
        registered.map_or(false, |r| {
            r.resource.release(r.id);
            true
        })
    }

    /// Resources still registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.lock().len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.lock().is_empty()
    }

    /// Release everything registered so far and return how many resources
    /// were released. Calling it again releases nothing.
    pub fn cleanup(&self) -> usize {
        let drained = std::mem::take(&mut *self.resources.lock());
        let count = drained.len();
        for registered in drained {
            debug!(
                resource = registered.id.0,
                kind = registered.resource.kind(),
                "releasing resource"
            );
            registered.resource.release(registered.id);
        }
        count
    }

    fn next_id(&self) -> ResourceId {
        ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn insert(&self, event: Option<String>, resource: Resource) -> ResourceId {
        let id = self.next_id();
        self.resources.lock().push(Registered {
            id,
            event,
            resource,
        });
        id
    }
}

impl Drop for ResourceRegistry {
    fn drop(&mut self) {
        let released = self.cleanup();
        if released > 0 {
            debug!(released, "registry dropped with live resources");
        }
    }
}
