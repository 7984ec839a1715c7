//! In-memory stores backing the runtime: queues and caches.

pub mod cache;
pub mod queue;
