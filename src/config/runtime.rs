//! Runtime configuration structures.
//!
//! Every section has defaults, so a partial JSON document or an empty
//! environment yields a usable configuration.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;

/// Prefix for environment overrides, e.g. `FRAMELOOP_EXECUTOR_CONCURRENCY`.
pub const ENV_PREFIX: &str = "FRAMELOOP_";

/// Bounded executor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum jobs running at once.
    pub concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Concurrency pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum tasks running at once. Defaults to the number of CPUs.
    pub max_concurrency: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrency: num_cpus::get(),
        }
    }
}

/// Memo cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// Maximum cached results per memoized function.
    pub capacity: usize,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

/// TTL cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlConfig {
    /// Entry lifetime in milliseconds.
    pub ttl_ms: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self { ttl_ms: 60_000 }
    }
}

/// Rolling statistics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Samples retained.
    pub window: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { window: 60 }
    }
}

/// Virtualized list geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Fixed row height.
    pub item_height: f64,
    /// Visible container height.
    pub container_height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            item_height: 48.0,
            container_height: 600.0,
        }
    }
}

/// Frame pacing for hosts that simulate frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Delay between frames in milliseconds.
    pub frame_interval_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
        }
    }
}

/// Debounce and throttle windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Quiet period before a debounced call runs, in milliseconds.
    pub debounce_ms: u64,
    /// Throttle window in milliseconds.
    pub throttle_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            throttle_ms: 100,
        }
    }
}

/// Root runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bounded executor.
    pub executor: ExecutorConfig,
    /// Concurrency pool.
    pub pool: PoolConfig,
    /// Memo cache.
    pub memo: MemoConfig,
    /// TTL cache.
    pub ttl: TtlConfig,
    /// Rolling statistics.
    pub stats: StatsConfig,
    /// Viewport geometry.
    pub viewport: ViewportConfig,
    /// Frame pacing.
    pub frame: FrameConfig,
    /// Rate limiting.
    pub rate_limit: RateLimitConfig,
}

impl ViewportConfig {
    /// Validate geometry values.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.item_height.is_finite() && self.item_height > 0.0) {
            return Err("item_height must be a positive number".into());
        }
        if !(self.container_height.is_finite() && self.container_height > 0.0) {
            return Err("container_height must be a positive number".into());
        }
        Ok(())
    }
}

impl RuntimeConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("executor.concurrency", self.executor.concurrency as u64),
            ("pool.max_concurrency", self.pool.max_concurrency as u64),
            ("memo.capacity", self.memo.capacity as u64),
            ("ttl.ttl_ms", self.ttl.ttl_ms),
            ("stats.window", self.stats.window as u64),
            ("frame.frame_interval_ms", self.frame.frame_interval_ms),
            ("rate_limit.debounce_ms", self.rate_limit.debounce_ms),
            ("rate_limit.throttle_ms", self.rate_limit.throttle_ms),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(format!("{name} must be greater than 0"));
            }
        }
        self.viewport
            .validate()
            .map_err(|e| format!("viewport invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load defaults overridden by `FRAMELOOP_*` variables, reading `.env`
    /// first if present, and validate.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        let mut cfg = Self::default();
        cfg.apply_overrides(|key| env::var(key).ok())?;
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }

    /// Apply overrides from `lookup`, which maps a full variable name such as
    /// `FRAMELOOP_TTL_TTL_MS` to its value.
    pub fn apply_overrides<L>(&mut self, lookup: L) -> AppResult<()>
    where
        L: Fn(&str) -> Option<String>,
    {
        override_with(&lookup, "EXECUTOR_CONCURRENCY", &mut self.executor.concurrency)?;
        override_with(&lookup, "POOL_MAX_CONCURRENCY", &mut self.pool.max_concurrency)?;
        override_with(&lookup, "MEMO_CAPACITY", &mut self.memo.capacity)?;
        override_with(&lookup, "TTL_TTL_MS", &mut self.ttl.ttl_ms)?;
        override_with(&lookup, "STATS_WINDOW", &mut self.stats.window)?;
        override_with(&lookup, "VIEWPORT_ITEM_HEIGHT", &mut self.viewport.item_height)?;
        override_with(
            &lookup,
            "VIEWPORT_CONTAINER_HEIGHT",
            &mut self.viewport.container_height,
        )?;
        override_with(&lookup, "FRAME_FRAME_INTERVAL_MS", &mut self.frame.frame_interval_ms)?;
        override_with(&lookup, "RATE_LIMIT_DEBOUNCE_MS", &mut self.rate_limit.debounce_ms)?;
        override_with(&lookup, "RATE_LIMIT_THROTTLE_MS", &mut self.rate_limit.throttle_ms)?;
        Ok(())
    }

    /// TTL as a duration.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl.ttl_ms)
    }

    /// Frame interval as a duration.
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame.frame_interval_ms)
    }

    /// Debounce delay as a duration.
    #[must_use]
    pub const fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit.debounce_ms)
    }

    /// Throttle window as a duration.
    #[must_use]
    pub const fn throttle_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit.throttle_ms)
    }
}

fn override_with<L, T>(lookup: &L, suffix: &str, slot: &mut T) -> AppResult<()>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let key = format!("{ENV_PREFIX}{suffix}");
    if let Some(raw) = lookup(&key) {
        *slot = raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value `{raw}`"))?;
    }
    Ok(())
}
