//! Orchestration state and its transition function
//!
//! Components never mutate the state they are given. Each returns a
//! `StateDelta` and the conductor folds it in with `OrchestrationState::apply`:
//!
//! - `messages` are appended
//! - `tasks`, `working_memory` and `execution_history` are replaced when present
//! - `current_task_id` and `awaiting_validation` are replaced when present,
//!   where `Some(None)` clears the pointer
//!
//! An empty delta leaves the state unchanged.

use sdk::errors::EngineError;
use sdk::types::{HistoryEntry, Task};
use serde::{Deserialize, Serialize};

use super::memory::WorkingMemory;
use crate::llm::{Message, MessageRole};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationState {
    /// Append-only conversation log
    pub messages: Vec<Message>,

    /// Planned tasks in creation order
    pub tasks: Vec<Task>,

    /// Task eligible for execution; `None` means no actionable work
    pub current_task_id: Option<String>,

    pub working_memory: WorkingMemory,

    /// Append-only audit log
    pub execution_history: Vec<HistoryEntry>,

    /// Task finished by an executor and not yet judged by the validator
    pub awaiting_validation: Option<String>,
}

impl OrchestrationState {
    /// Fresh state for one user request
    pub fn new(request: &str) -> Self {
        Self {
            messages: vec![Message::user(request)],
            ..Self::default()
        }
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current_task_id
            .as_deref()
            .and_then(|id| self.find_task(id))
    }

    /// Content of the most recent user message
    pub fn latest_request(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_pending()).count()
    }

    /// Copy of `tasks` with one task updated in place
    ///
    /// # Errors
    ///
    /// `TaskNotFound` if no task has `id`, or whatever `update` returns.
    pub fn tasks_with<F>(&self, id: &str, update: F) -> Result<Vec<Task>, EngineError>
    where
        F: FnOnce(&mut Task) -> Result<(), EngineError>,
    {
        let mut tasks = self.tasks.clone();
        let task = tasks
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| EngineError::TaskNotFound(id.to_string()))?;
        update(task)?;
        Ok(tasks)
    }

    /// Copy of the history with one entry appended
    pub fn history_with(&self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        let mut history = self.execution_history.clone();
        history.push(entry);
        history
    }

    /// Fold a component's output into the state
    pub fn apply(mut self, delta: StateDelta) -> Self {
        self.messages.extend(delta.messages);
        if let Some(tasks) = delta.tasks {
            self.tasks = tasks;
        }
        if let Some(current) = delta.current_task_id {
            self.current_task_id = current;
        }
        if let Some(memory) = delta.working_memory {
            self.working_memory = memory;
        }
        if let Some(history) = delta.execution_history {
            self.execution_history = history;
        }
        if let Some(awaiting) = delta.awaiting_validation {
            self.awaiting_validation = awaiting;
        }
        self
    }
}

/// Id of the first pending task, in creation order
pub fn first_pending(tasks: &[Task]) -> Option<String> {
    tasks
        .iter()
        .find(|t| t.is_pending())
        .map(|t| t.id().to_string())
}

/// The fields a component changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDelta {
    pub messages: Vec<Message>,
    pub tasks: Option<Vec<Task>>,
    pub current_task_id: Option<Option<String>>,
    pub working_memory: Option<WorkingMemory>,
    pub execution_history: Option<Vec<HistoryEntry>>,
    pub awaiting_validation: Option<Option<String>>,
}

impl StateDelta {
    /// A delta that changes nothing
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn current(mut self, id: Option<String>) -> Self {
        self.current_task_id = Some(id);
        self
    }

    pub fn working_memory(mut self, memory: WorkingMemory) -> Self {
        self.working_memory = Some(memory);
        self
    }

    pub fn history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.execution_history = Some(history);
        self
    }

    pub fn awaiting(mut self, id: Option<String>) -> Self {
        self.awaiting_validation = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdk::types::{HistoryAction, TaskKind};

    fn state_with_tasks() -> OrchestrationState {
        let a = Task::with_param(TaskKind::ShellCommand, "a", "command", "ls");
        let b = Task::with_param(TaskKind::ShellCommand, "b", "command", "pwd");
        let current = Some(a.id().to_string());
        OrchestrationState {
            tasks: vec![a, b],
            current_task_id: current,
            ..OrchestrationState::new("do things")
        }
    }

    #[test]
    fn test_empty_delta_is_identity() {
        let state = state_with_tasks();
        assert_eq!(state.clone().apply(StateDelta::unchanged()), state);
        assert!(StateDelta::unchanged().is_empty());
    }

    #[test]
    fn test_messages_append_and_pointer_clears() {
        let state = state_with_tasks();
        let next = state
            .clone()
            .apply(StateDelta::unchanged().message(Message::assistant("hi")).current(None));

        assert_eq!(next.messages.len(), 2);
        assert_eq!(next.messages[0], state.messages[0]);
        assert!(next.current_task_id.is_none());
        assert_eq!(next.tasks, state.tasks);
    }

    #[test]
    fn test_tasks_with_updates_one_entry() {
        let state = state_with_tasks();
        let id = state.tasks[0].id().to_string();
        let tasks = state
            .tasks_with(&id, |t| {
                t.start()?;
                t.complete("done")
            })
            .unwrap();

        assert!(tasks[0].is_terminal());
        assert!(tasks[1].is_pending());
        assert!(state.tasks[0].is_pending());
        assert_eq!(first_pending(&tasks), Some(tasks[1].id().to_string()));
    }

    #[test]
    fn test_tasks_with_unknown_id() {
        let state = state_with_tasks();
        assert!(matches!(
            state.tasks_with("nope", |_| Ok(())),
            Err(EngineError::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_history_with_appends() {
        let state = state_with_tasks();
        let history = state.history_with(HistoryEntry::new("x", HistoryAction::Validation, "ok"));
        assert_eq!(history.len(), 1);
        assert!(state.execution_history.is_empty());
    }

    #[test]
    fn test_latest_request() {
        let mut state = OrchestrationState::new("first");
        state.messages.push(Message::assistant("reply"));
        assert_eq!(state.latest_request(), Some("first"));
        assert_eq!(OrchestrationState::default().latest_request(), None);
    }
}
