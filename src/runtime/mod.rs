//! Single-writer async runtime and event stream APIs.

/// Event stream and persistence status types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
