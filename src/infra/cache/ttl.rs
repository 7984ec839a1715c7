//! Time-expiring key/value store with lazy expiry.
//!
//! No background task evicts entries. An expired entry is removed only when a
//! read finds it or when [`TtlCache::prune`] sweeps the store, so a cache that
//! is written but never read or pruned keeps growing. Pruning is the caller's
//! job.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tracing::debug;

use crate::core::error::RuntimeError;
use crate::util::clock::{Clock, MonotonicClock};

#[derive(Debug, Clone)]
struct TtlEntry<V> {
    value: V,
    expires_at: Duration,
}

impl<V> TtlEntry<V> {
    fn is_expired(&self, now: Duration) -> bool {
        now > self.expires_at
    }
}

/// Key/value store whose entries expire a fixed `ttl` after they are set.
#[derive(Debug)]
pub struct TtlCache<K, V, C = MonotonicClock> {
    entries: HashMap<K, TtlEntry<V>>,
    ttl: Duration,
    clock: C,
}

impl<K: Eq + Hash, V> TtlCache<K, V, MonotonicClock> {
    /// Create a cache on the monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` when `ttl` is zero.
    pub fn new(ttl: Duration) -> Result<Self, RuntimeError> {
        Self::with_clock(ttl, MonotonicClock::new())
    }
}

impl<K: Eq + Hash, V, C: Clock> TtlCache<K, V, C> {
    /// Create a cache that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` when `ttl` is zero.
    pub fn with_clock(ttl: Duration, clock: C) -> Result<Self, RuntimeError> {
        if ttl.is_zero() {
            return Err(RuntimeError::InvalidConfig(
                "ttl must be greater than 0".into(),
            ));
        }
        Ok(Self {
            entries: HashMap::new(),
            ttl,
            clock,
        })
    }

    /// Store `value`, expiring `ttl` from now. Replaces any previous entry.
    pub fn set(&mut self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(key, TtlEntry { value, expires_at });
    }

    /// Live value for `key`. An expired entry is deleted and reported absent.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if !self.contains_key(key) {
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Whether a live entry exists for `key`. Deletes it if expired.
    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Remove `key`, returning its value whether or not it had expired.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Delete every expired entry and return how many were removed.
    pub fn prune(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "pruned expired entries");
        }
        removed
    }

    /// Remove every entry, expired or not.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries stored, including expired ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lifetime applied to each entry.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}
