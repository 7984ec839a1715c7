//! In-memory caches.
//!
//! Neither cache touches durable storage. Both bound their memory in a way the
//! caller controls: the memo cache by capacity, the TTL cache by pruning.

pub mod memo;
pub mod ttl;

pub use memo::{memoize, MemoCache, Memoized};
pub use ttl::TtlCache;
