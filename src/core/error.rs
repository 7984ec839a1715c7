//! Error types for runtime components.

use std::any::Any;

use thiserror::Error;

/// Errors produced by runtime components.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A capacity, ttl, or geometry value was rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// An argument tuple could not be serialized into a cache key.
    #[error("cache key error: {0}")]
    CacheKey(#[from] serde_json::Error),
    /// A task or update panicked inside its failure boundary.
    #[error("task panicked: {0}")]
    TaskPanicked(String),
    /// The pool dropped a task before it produced a result.
    #[error("task handle dropped before completion")]
    HandleDropped,
    /// No tokio runtime is available on the current thread.
    #[error("no tokio runtime available")]
    NoRuntime,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

/// Extract a readable message from a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
