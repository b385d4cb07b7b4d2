//! Taskflow SDK
//!
//! Shared library providing the task model and error types used by the
//! engine and its tests.

/// Error types and handling
pub mod errors;

/// Task model types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, TaskflowErrorExt};
pub use types::{HistoryAction, HistoryEntry, Task, TaskKind, TaskParameters, TaskStatus};
