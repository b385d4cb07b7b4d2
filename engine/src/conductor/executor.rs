//! Conductor Executors
//!
//! One executor per actionable task kind. Each claims the current task only
//! when its kind matches and it is still pending, performs the side effect,
//! and records the outcome. Anything else passes through unchanged.
//!
//! Failures are data: a rejected command, a missing parameter or a transport
//! error ends with `status = failed` and an explanatory result.

use async_trait::async_trait;
use sdk::types::{HistoryAction, HistoryEntry, Task, TaskKind, TaskStatus};
use tracing::{info, warn};

use super::state::{first_pending, OrchestrationState, StateDelta};
use super::Component;
use crate::llm::Message;
use crate::tools::{TerminalTool, WebFetcher};

/// The current task, if it is pending and of `kind`
fn claim(state: &OrchestrationState, kind: TaskKind) -> Option<&Task> {
    state
        .current_task()
        .filter(|task| task.kind() == kind && task.is_pending())
}

fn missing_parameter(name: &str) -> String {
    format!("Missing required parameter '{}'", name)
}

/// Record a finished task: status, result, frontier, history and message
fn record_outcome(
    state: &OrchestrationState,
    task: &Task,
    success: bool,
    result: String,
    action: HistoryAction,
    label: &str,
) -> StateDelta {
    let status = if success {
        TaskStatus::Completed
    } else {
        TaskStatus::Failed
    };

    let tasks = match state.tasks_with(task.id(), |t| {
        t.start()?;
        t.finish(status, result.clone())
    }) {
        Ok(tasks) => tasks,
        Err(e) => {
            warn!("Could not record outcome for task {}: {}", task.id(), e);
            return StateDelta::unchanged();
        }
    };

    let verb = if success { "succeeded" } else { "failed" };
    info!("Task {} {}", task.id(), verb);

    let history = state.history_with(HistoryEntry::new(
        task.id(),
        action,
        format!("{}: {}", verb, task.description()),
    ));

    StateDelta::unchanged()
        .current(first_pending(&tasks))
        .awaiting(Some(task.id().to_string()))
        .tasks(tasks)
        .history(history)
        .message(Message::assistant(format!("{}: {}", label, result)))
}

/// Executes `network-fetch` tasks
pub struct NetworkFetchExecutor {
    fetcher: WebFetcher,
}

impl NetworkFetchExecutor {
    pub fn new(fetcher: WebFetcher) -> Self {
        Self { fetcher }
    }

    async fn fetch(&self, url: &str) -> (bool, String) {
        match self.fetcher.fetch(url).await {
            Ok(page) => (true, page.summary()),
            Err(e) => {
                warn!("Fetch of {} failed: {}", url, e);
                (false, format!("Failed to fetch {}: {}", url, e))
            }
        }
    }
}

#[async_trait]
impl Component for NetworkFetchExecutor {
    fn name(&self) -> &'static str {
        "network_fetch"
    }

    async fn run(&self, state: &OrchestrationState) -> StateDelta {
        let Some(task) = claim(state, TaskKind::NetworkFetch) else {
            return StateDelta::unchanged();
        };

        let (success, result) = match task.param_str("url") {
            Some(url) => self.fetch(url).await,
            None => (false, missing_parameter("url")),
        };

        record_outcome(
            state,
            task,
            success,
            result,
            HistoryAction::NetworkFetch,
            "Network fetch result",
        )
    }
}

/// Executes `shell-command` tasks
pub struct ShellCommandExecutor {
    terminal: TerminalTool,
}

impl ShellCommandExecutor {
    pub fn new(terminal: TerminalTool) -> Self {
        Self { terminal }
    }
}

#[async_trait]
impl Component for ShellCommandExecutor {
    fn name(&self) -> &'static str {
        "shell_command"
    }

    async fn run(&self, state: &OrchestrationState) -> StateDelta {
        let Some(task) = claim(state, TaskKind::ShellCommand) else {
            return StateDelta::unchanged();
        };

        let (success, result) = match task.param_str("command") {
            Some(command) => {
                let outcome = self.terminal.execute(command).await;
                (outcome.success, outcome.summary)
            }
            None => (false, missing_parameter("command")),
        };

        record_outcome(
            state,
            task,
            success,
            result,
            HistoryAction::ShellCommand,
            "Shell command result",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ShellConfig, WebConfig};
    use sdk::types::TaskParameters;

    fn shell_executor() -> ShellCommandExecutor {
        let config = ShellConfig {
            safe_commands: vec!["echo".to_string()],
            timeout_secs: 5,
            ..ShellConfig::default()
        };
        ShellCommandExecutor::new(TerminalTool::with_work_dir(&config, std::env::temp_dir()))
    }

    fn state_of(tasks: Vec<Task>) -> OrchestrationState {
        OrchestrationState {
            current_task_id: tasks.first().map(|t| t.id().to_string()),
            tasks,
            ..OrchestrationState::new("request")
        }
    }

    #[tokio::test]
    async fn test_shell_success_advances_frontier() {
        let state = state_of(vec![
            Task::with_param(TaskKind::ShellCommand, "greet", "command", "echo hi"),
            Task::new(TaskKind::Reflect, "think", TaskParameters::new()),
        ]);
        let next = state.clone().apply(shell_executor().run(&state).await);

        assert_eq!(next.tasks[0].status(), TaskStatus::Completed);
        assert!(next.tasks[0].result().is_some_and(|r| r.contains("hi")));
        assert_eq!(next.current_task_id.as_deref(), Some(next.tasks[1].id()));
        assert_eq!(next.awaiting_validation.as_deref(), Some(next.tasks[0].id()));
        assert_eq!(next.execution_history.len(), 1);
        assert_eq!(next.execution_history[0].result_summary, "succeeded: greet");
        assert!(next
            .last_message()
            .is_some_and(|m| m.content.starts_with("Shell command result: Command 'echo hi' succeeded")));
    }

    #[tokio::test]
    async fn test_missing_parameter_fails_without_side_effect() {
        let state = state_of(vec![Task::new(
            TaskKind::ShellCommand,
            "nothing",
            TaskParameters::new(),
        )]);
        let next = state.clone().apply(shell_executor().run(&state).await);

        assert_eq!(next.tasks[0].status(), TaskStatus::Failed);
        assert_eq!(
            next.tasks[0].result(),
            Some("Missing required parameter 'command'")
        );
        assert!(next.current_task_id.is_none());
        assert_eq!(next.execution_history[0].action, HistoryAction::ShellCommand);
        assert_eq!(next.execution_history[0].result_summary, "failed: nothing");
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_a_no_op() {
        let state = state_of(vec![Task::with_param(
            TaskKind::NetworkFetch,
            "fetch",
            "url",
            "https://example.com",
        )]);
        assert!(shell_executor().run(&state).await.is_empty());

        let fetcher = WebFetcher::new(&WebConfig::default()).unwrap();
        let state = state_of(vec![Task::with_param(
            TaskKind::ShellCommand,
            "greet",
            "command",
            "echo hi",
        )]);
        assert!(NetworkFetchExecutor::new(fetcher).run(&state).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_current_task_is_a_no_op() {
        let mut state = state_of(vec![Task::with_param(
            TaskKind::ShellCommand,
            "greet",
            "command",
            "echo hi",
        )]);
        state.current_task_id = None;
        assert!(shell_executor().run(&state).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_a_failed_task() {
        let fetcher = WebFetcher::new(&WebConfig::default()).unwrap();
        let state = state_of(vec![Task::with_param(
            TaskKind::NetworkFetch,
            "fetch",
            "url",
            "ftp://example.com/file",
        )]);
        let next = state
            .clone()
            .apply(NetworkFetchExecutor::new(fetcher).run(&state).await);

        assert_eq!(next.tasks[0].status(), TaskStatus::Failed);
        assert!(next.tasks[0]
            .result()
            .is_some_and(|r| r.starts_with("Failed to fetch ftp://example.com/file:")));
    }
}
