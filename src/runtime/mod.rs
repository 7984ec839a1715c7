//! Host adapters: the primitives the runtime consumes and their implementations.

pub mod host;
pub mod manual;
pub mod tokio_host;

pub use host::{Callback, FrameHost, IdleHost, RepeatingCallback, TimerHandle, TimerHost};
pub use manual::ManualHost;
pub use tokio_host::TokioHost;
