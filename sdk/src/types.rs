//! Task model types
//!
//! A `Task` is one unit of planned work. Its kind, description and parameters
//! are fixed at creation; only `status` and `result` move, and only forward:
//! `pending -> running -> {completed, failed}`. A terminal task never changes
//! again.

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameters attached to a task (e.g. `url`, `command`)
pub type TaskParameters = BTreeMap<String, serde_json::Value>;

/// The closed set of task kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Fetch a web resource (`url` parameter)
    NetworkFetch,

    /// Run an allow-listed command (`command` parameter)
    ShellCommand,

    /// Generate or run code (no dedicated executor)
    Code,

    /// Think about and summarize what is known (no dedicated executor)
    Reflect,
}

impl TaskKind {
    /// Parse a kind label, accepting the common aliases a model produces.
    ///
    /// Returns `None` for labels outside the closed set.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "network-fetch" | "network_fetch" | "fetch" | "web" | "http" => {
                Some(Self::NetworkFetch)
            }
            "shell-command" | "shell_command" | "shell" | "cli" | "command" => {
                Some(Self::ShellCommand)
            }
            "code" => Some(Self::Code),
            "reflect" | "reflection" | "think" => Some(Self::Reflect),
            _ => None,
        }
    }

    /// Parse a kind label, mapping anything unknown to `Reflect`.
    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or_else(|| {
            tracing::warn!("Unknown task type '{}', treating it as reflect", label);
            Self::Reflect
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkFetch => "network-fetch",
            Self::ShellCommand => "shell-command",
            Self::Code => "code",
            Self::Reflect => "reflect",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Completed or failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A planned unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: String,
    #[serde(rename = "type")]
    kind: TaskKind,
    description: String,
    #[serde(default)]
    parameters: TaskParameters,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    status: TaskStatus,
}

impl Task {
    /// Create a new pending task with a fresh id
    pub fn new(kind: TaskKind, description: impl Into<String>, parameters: TaskParameters) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            description: description.into(),
            parameters,
            result: None,
            status: TaskStatus::Pending,
        }
    }

    /// Create a pending task with a single string parameter
    pub fn with_param(
        kind: TaskKind,
        description: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let mut parameters = TaskParameters::new();
        parameters.insert(key.into(), serde_json::Value::String(value.into()));
        Self::new(kind, description, parameters)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &TaskParameters {
        &self.parameters
    }

    /// Get a non-empty string parameter
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move a pending task to running
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.status != TaskStatus::Pending {
            return Err(self.transition_error(TaskStatus::Running));
        }
        self.status = TaskStatus::Running;
        Ok(())
    }

    /// Move a task to a terminal status and record its result.
    ///
    /// Fails without touching the task if `status` is not terminal or the
    /// task already finished.
    pub fn finish(&mut self, status: TaskStatus, result: impl Into<String>) -> Result<(), EngineError> {
        if !status.is_terminal() || self.status.is_terminal() {
            return Err(self.transition_error(status));
        }
        self.status = status;
        self.result = Some(result.into());
        Ok(())
    }

    pub fn complete(&mut self, result: impl Into<String>) -> Result<(), EngineError> {
        self.finish(TaskStatus::Completed, result)
    }

    pub fn fail(&mut self, result: impl Into<String>) -> Result<(), EngineError> {
        self.finish(TaskStatus::Failed, result)
    }

    fn transition_error(&self, to: TaskStatus) -> EngineError {
        EngineError::InvalidTransition {
            task_id: self.id.clone(),
            from: self.status,
            to,
        }
    }
}

/// What produced an execution history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    NetworkFetch,
    ShellCommand,
    Validation,
    ValidationError,
}

impl fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFetch => write!(f, "network_fetch"),
            Self::ShellCommand => write!(f, "shell_command"),
            Self::Validation => write!(f, "validation"),
            Self::ValidationError => write!(f, "validation_error"),
        }
    }
}

/// One audit log entry, appended per executor run and per validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub task_id: String,
    pub action: HistoryAction,
    pub result_summary: String,
}

impl HistoryEntry {
    pub fn new(
        task_id: impl Into<String>,
        action: HistoryAction,
        result_summary: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            action,
            result_summary: result_summary.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_pending_without_result() {
        let task = Task::with_param(TaskKind::ShellCommand, "list files", "command", "ls");
        assert_eq!(task.status(), TaskStatus::Pending);
        assert!(task.result().is_none());
        assert_eq!(task.param_str("command"), Some("ls"));
        assert!(task.param_str("url").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Task::new(TaskKind::Reflect, "a", TaskParameters::new());
        let b = Task::new(TaskKind::Reflect, "a", TaskParameters::new());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_lifecycle_is_monotonic() {
        let mut task = Task::new(TaskKind::Reflect, "think", TaskParameters::new());
        task.start().unwrap();
        task.complete("done").unwrap();

        assert!(task.fail("again").is_err());
        assert!(task.start().is_err());
        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.result(), Some("done"));
    }

    #[test]
    fn test_finish_requires_terminal_status() {
        let mut task = Task::new(TaskKind::Code, "code", TaskParameters::new());
        assert!(task.finish(TaskStatus::Running, "x").is_err());
        assert!(task.result().is_none());
    }

    #[test]
    fn test_blank_parameter_counts_as_missing() {
        let task = Task::with_param(TaskKind::NetworkFetch, "fetch", "url", "   ");
        assert!(task.param_str("url").is_none());
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(TaskKind::parse("web"), Some(TaskKind::NetworkFetch));
        assert_eq!(TaskKind::parse("CLI"), Some(TaskKind::ShellCommand));
        assert_eq!(TaskKind::parse("shell-command"), Some(TaskKind::ShellCommand));
        assert_eq!(TaskKind::parse("telepathy"), None);
        assert_eq!(TaskKind::from_label("telepathy"), TaskKind::Reflect);
    }

    #[test]
    fn test_task_serialization_uses_type_key() {
        let task = Task::with_param(TaskKind::NetworkFetch, "fetch", "url", "https://example.com");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["type"], "network-fetch");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["parameters"]["url"], "https://example.com");
    }
}
