//! Build the shared runtime components from a [`RuntimeConfig`].

use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::core::{
    debounce, throttle, BoundedExecutor, ConcurrencyPool, Debounced, PriorityScheduler,
    ResourceRegistry, RuntimeError, Throttled, UpdateBatcher,
};
use crate::infra::cache::{memoize, Memoized, TtlCache};
use crate::runtime::TokioHost;
use crate::util::{MonotonicClock, RollingStats, ViewportWindow};

/// Process-wide runtime components plus factories for per-use components.
pub struct RuntimeContext {
    /// Validated configuration the context was built from.
    pub config: RuntimeConfig,
    /// Host every component schedules onto.
    pub host: TokioHost,
    /// Shared bounded executor.
    pub executor: BoundedExecutor<TokioHost>,
    /// Shared per-frame update batcher.
    pub batcher: UpdateBatcher,
    /// Shared priority scheduler.
    pub scheduler: PriorityScheduler,
    /// Registry for timers and observers owned by the runtime's user.
    pub registry: ResourceRegistry,
}

/// Validate `cfg` and build the shared components on `host`.
///
/// The host's frame interval is taken from `cfg.frame`.
///
/// # Errors
///
/// Returns `RuntimeError::InvalidConfig` when validation fails.
pub fn build_runtime(cfg: &RuntimeConfig, host: TokioHost) -> Result<RuntimeContext, RuntimeError> {
    cfg.validate()
        .map_err(|e| RuntimeError::InvalidConfig(format!("config invalid: {e}")))?;

    let host = host.with_frame_interval(cfg.frame_interval());
    let shared = Arc::new(host.clone());
    let executor = BoundedExecutor::new(cfg.executor.concurrency, host.clone())?;
    let batcher = UpdateBatcher::new(shared.clone());
    let scheduler = PriorityScheduler::new(shared.clone(), shared.clone());
    let registry = ResourceRegistry::new(shared);

    info!(
        concurrency = cfg.executor.concurrency,
        frame_interval_ms = cfg.frame.frame_interval_ms,
        "runtime built"
    );

    Ok(RuntimeContext {
        config: cfg.clone(),
        host,
        executor,
        batcher,
        scheduler,
        registry,
    })
}

impl RuntimeContext {
    /// New concurrency pool sized by `pool.max_concurrency`.
    ///
    /// # Errors
    ///
    /// Propagates pool construction errors.
    pub fn pool<T>(&self) -> Result<ConcurrencyPool<T, TokioHost>, RuntimeError>
    where
        T: Clone + Send + 'static,
    {
        ConcurrencyPool::new(self.config.pool.max_concurrency, self.host.clone())
    }

    /// Memoize `func` with `memo.capacity` entries.
    ///
    /// # Errors
    ///
    /// Propagates cache construction errors.
    pub fn memoize<A, R, F>(&self, func: F) -> Result<Memoized<A, R>, RuntimeError>
    where
        A: Serialize,
        R: Clone,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        memoize(func, self.config.memo.capacity)
    }

    /// New TTL cache with `ttl.ttl_ms` lifetime.
    ///
    /// # Errors
    ///
    /// Propagates cache construction errors.
    pub fn ttl_cache<K, V>(&self) -> Result<TtlCache<K, V, MonotonicClock>, RuntimeError>
    where
        K: Eq + Hash,
    {
        TtlCache::new(self.config.ttl())
    }

    /// New rolling window of `stats.window` samples.
    ///
    /// # Errors
    ///
    /// Propagates construction errors.
    pub fn rolling_stats(&self) -> Result<RollingStats, RuntimeError> {
        RollingStats::new(self.config.stats.window)
    }

    /// New viewport calculator with the configured geometry.
    ///
    /// # Errors
    ///
    /// Propagates geometry validation errors.
    pub fn viewport(&self) -> Result<ViewportWindow, RuntimeError> {
        ViewportWindow::new(
            self.config.viewport.item_height,
            self.config.viewport.container_height,
        )
    }

    /// Debounce `func` by `rate_limit.debounce_ms` on the runtime's timers.
    ///
    /// # Errors
    ///
    /// Propagates construction errors.
    pub fn debounce<A, F>(&self, func: F) -> Result<Debounced<A>, RuntimeError>
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        debounce(func, self.config.debounce_delay(), Arc::new(self.host.clone()))
    }

    /// Throttle `func` to one call per `rate_limit.throttle_ms`.
    ///
    /// # Errors
    ///
    /// Propagates construction errors.
    pub fn throttle<A, F>(&self, func: F) -> Result<Throttled<A, MonotonicClock>, RuntimeError>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        throttle(func, self.config.throttle_limit(), MonotonicClock::new())
    }
}
