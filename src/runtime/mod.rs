//! Async runtime handle and event stream APIs.

/// Event stream types emitted by the runtime.
pub mod events;
/// Handle implementation.
pub mod handle;
