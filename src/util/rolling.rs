//! Fixed-window numeric aggregator.

use std::collections::VecDeque;

use crate::core::RuntimeError;

/// Sliding window over the most recent `capacity` samples.
///
/// All reads are derived from the samples currently retained and return `0.0`
/// on an empty window.
#[derive(Debug, Clone)]
pub struct RollingStats {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl RollingStats {
    /// Create an empty window holding at most `capacity` samples.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, RuntimeError> {
        if capacity == 0 {
            return Err(RuntimeError::InvalidConfig(
                "rolling window capacity must be greater than 0".into(),
            ));
        }
        Ok(Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        })
    }

    /// Append a sample, dropping the oldest one on overflow.
    pub fn add(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Arithmetic mean of the retained samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Smallest retained sample.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::min).unwrap_or(0.0)
    }

    /// Largest retained sample.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.samples.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// Number of retained samples, never more than `capacity`.
    #[must_use]
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
