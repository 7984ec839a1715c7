//! Core scheduling abstractions: executors, schedulers, batching, and rate limiting.

pub mod batcher;
pub mod error;
pub mod executor;
pub mod rate_limit;
pub mod registry;
pub mod scheduler;
pub mod worker_pool;

pub use batcher::{BatcherStats, UpdateBatcher};
pub use error::{AppResult, RuntimeError};
pub use executor::{BoundedExecutor, JobOutcome, QueuedJob, Spawn};
pub use rate_limit::{debounce, throttle, Debounced, Throttled};
pub use registry::{Observer, ResourceId, ResourceRegistry};
pub use scheduler::{Priority, PriorityScheduler, SchedulerStats};
pub use worker_pool::{ConcurrencyPool, PoolStats, TaskHandle};
