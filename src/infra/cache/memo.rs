//! Bounded memoization with first-in, first-out eviction.
//!
//! A hit does not refresh an entry's position: when the cache is full, the
//! entry inserted earliest is evicted even if it was read a moment ago.

use std::collections::{HashMap, VecDeque};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;

use crate::core::error::RuntimeError;

/// Capacity-bounded string-keyed store that evicts in insertion order.
#[derive(Debug, Clone)]
pub struct MemoCache<V> {
    entries: HashMap<String, V>,
    order: VecDeque<String>,
    capacity: usize,
}

impl<V> MemoCache<V> {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::InvalidConfig` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, RuntimeError> {
        if capacity == 0 {
            return Err(RuntimeError::InvalidConfig(
                "memo capacity must be greater than 0".into(),
            ));
        }
        Ok(Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Stored value for `key`. Does not change eviction order.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Store `value` under `key`, evicting the oldest entry if the cache is
    /// over capacity afterwards. Returns the evicted key, if any.
    ///
    /// Replacing an existing key keeps its original insertion position.
    pub fn insert(&mut self, key: String, value: V) -> Option<String> {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);

        if self.entries.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            self.entries.remove(&oldest);
            trace!(key = %oldest, "memo entry evicted");
            return Some(oldest);
        }
        None
    }

    /// Whether `key` is stored.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Callable whose results are cached by serialized argument value.
pub struct Memoized<A, R> {
    func: Arc<dyn Fn(A) -> R + Send + Sync + 'static>,
    cache: Arc<Mutex<MemoCache<R>>>,
    _args: PhantomData<fn(A)>,
}

impl<A, R> Clone for Memoized<A, R> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            cache: Arc::clone(&self.cache),
            _args: PhantomData,
        }
    }
}

/// Wrap `func` with a cache of at most `capacity` results.
///
/// Arguments are keyed by their JSON serialization, so two argument values
/// that serialize identically share an entry. Object keys are sorted before
/// the key is built, so map arguments hit regardless of iteration order.
///
/// # Errors
///
/// Returns `RuntimeError::InvalidConfig` when `capacity` is zero.
pub fn memoize<A, R, F>(func: F, capacity: usize) -> Result<Memoized<A, R>, RuntimeError>
where
    A: Serialize,
    R: Clone,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    Ok(Memoized {
        func: Arc::new(func),
        cache: Arc::new(Mutex::new(MemoCache::new(capacity)?)),
        _args: PhantomData,
    })
}

impl<A: Serialize, R: Clone> Memoized<A, R> {
    /// Cached result for `args`, computing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::CacheKey` when `args` cannot be serialized.
    /// `func` is not called in that case.
    pub fn call(&self, args: A) -> Result<R, RuntimeError> {
        let key = serde_json::to_value(&args)?.to_string();
        if let Some(hit) = self.cache.lock().get(&key) {
            return Ok(hit.clone());
        }

        let value = (self.func)(args);

        let mut cache = self.cache.lock();
        if !cache.contains_key(&key) {
            cache.insert(key, value.clone());
        }
        Ok(value)
    }

    /// Results currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Forget every cached result.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}
