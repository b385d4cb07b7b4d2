//! Error types and handling
//!
//! This module provides the error types shared by the Taskflow crates.
//! All errors implement the `TaskflowErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Orchestration components never surface these errors to the user directly:
//! task-level failures are recorded as task data. `EngineError` covers the
//! surrounding plumbing (configuration, providers, task transitions, IO).

use crate::types::TaskStatus;
use thiserror::Error;

/// Trait for Taskflow error extensions
pub trait TaskflowErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets (API keys, tokens) or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors require the user to fix their setup first.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, TaskflowErrorExt};
///
/// let error = EngineError::Config("bad log level".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(!error.is_recoverable());
///
/// let transient = EngineError::Network("connection reset".to_string());
/// assert!(transient.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Text generation errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Task lifecycle errors
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskflowErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::LLMProvider(_) => "Text generation unavailable. Check the model server and API keys",
            Self::TaskNotFound(_) => "The requested task does not exist in this run",
            Self::InvalidTransition { .. } => "A task was updated out of order",
            Self::Network(_) => "Network operation failed. Check your connection",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
