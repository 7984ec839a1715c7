//! Shared utilities: clocks, telemetry, and pure numeric helpers.

pub mod clock;
pub mod rolling;
pub mod telemetry;
pub mod viewport;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use rolling::RollingStats;
pub use telemetry::init_tracing;
pub use viewport::{ViewportWindow, VisibleRange};
