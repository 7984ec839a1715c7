//! Configuration models for every runtime component.

pub mod runtime;

pub use runtime::{
    ExecutorConfig, FrameConfig, MemoConfig, PoolConfig, RateLimitConfig, RuntimeConfig,
    StatsConfig, TtlConfig, ViewportConfig,
};
