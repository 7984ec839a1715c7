//! # frameloop
//!
//! Cooperative scheduling and caching runtime for interactive front ends.
//!
//! Every component here assumes a single callback-driven event loop with no
//! preemption. Work reaches that loop through host primitives (next frame,
//! idle time, and timers) rather than through OS threads, so the same
//! components run under tokio or under a render loop that drives
//! [`runtime::ManualHost`] itself.
//!
//! ## Components
//!
//! - **`BoundedExecutor`**: runs at most `k` async jobs at once, FIFO for the rest
//! - **`ConcurrencyPool`**: same dispatch, with a result handle per submission
//! - **`PriorityScheduler`**: ranked one-shot work, one task per idle continuation
//! - **`UpdateBatcher`**: coalesces update requests into one flush per frame
//! - **`debounce` / `throttle`**: suppress excess calls to a callable
//! - **`MemoCache` / `memoize`**: bounded result cache with FIFO eviction
//! - **`TtlCache`**: lazily expiring key/value store
//! - **`RollingStats`**: fixed-window numeric aggregates
//! - **`ViewportWindow`**: visible slice of a virtualized list
//! - **`ResourceRegistry`**: releases timers and observers in one call
//!
//! ## Example
//!
//! ```rust,ignore
//! use frameloop::builders::build_runtime;
//! use frameloop::config::RuntimeConfig;
//! use frameloop::runtime::TokioHost;
//!
//! let cfg = RuntimeConfig::from_env()?;
//! let ctx = build_runtime(&cfg, TokioHost::current()?)?;
//!
//! ctx.batcher.schedule(|| redraw_badge());
//! ctx.scheduler.add(|| prefetch_visible(), Priority::HIGH);
//! ctx.executor.add(|| async { sync_progress().await });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: executors, schedulers, batching, and rate limiting.
pub mod core;
/// Configuration models for every runtime component.
pub mod config;
/// Builders that assemble runtime components from configuration.
pub mod builders;
/// In-memory queue and cache implementations.
pub mod infra;
/// Host adapters supplying frame, idle, and timer primitives.
pub mod runtime;
/// Shared utilities.
pub mod util;
