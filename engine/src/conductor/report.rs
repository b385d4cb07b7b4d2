//! Conductor Report Generator
//!
//! Terminal component. Summarizes every task and the execution history and
//! asks the text generator for the final answer.

use async_trait::async_trait;
use sdk::types::{Task, TaskStatus};
use std::sync::Arc;

use super::planner::{is_date_query, EMPTY_REQUEST_PROMPT};
use super::router::{route, Destination};
use super::state::{OrchestrationState, StateDelta};
use super::Component;
use crate::config::ReportConfig;
use crate::llm::{Message, MessageRole, TextGenerator};
use crate::tools::truncate_chars;

pub struct ReportGenerator {
    generator: Arc<dyn TextGenerator>,
    result_preview_chars: usize,
}

fn status_glyph(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Completed => "✅",
        TaskStatus::Failed => "❌",
        TaskStatus::Pending | TaskStatus::Running => "⏳",
    }
}

impl ReportGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &ReportConfig) -> Self {
        Self {
            generator,
            result_preview_chars: config.result_preview_chars,
        }
    }

    /// One line per task: glyph, description, kind and result preview
    pub fn task_summary(&self, tasks: &[Task]) -> String {
        tasks
            .iter()
            .map(|task| {
                let preview = task
                    .result()
                    .map(|r| truncate_chars(r, self.result_preview_chars))
                    .unwrap_or_else(|| "(no result)".to_string());
                format!(
                    "{} {} ({}): {}",
                    status_glyph(task.status()),
                    task.description(),
                    task.kind(),
                    preview
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn history_summary(state: &OrchestrationState) -> String {
        if state.execution_history.is_empty() {
            return "(nothing executed)".to_string();
        }
        state
            .execution_history
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                format!(
                    "{}. [{}] {}: {}",
                    i + 1,
                    entry.action,
                    entry.task_id,
                    entry.result_summary
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn build_prompt(&self, state: &OrchestrationState) -> String {
        format!(
            "You are writing the final answer for a user. Use the task results below.\n\
            Mention any task that failed and what that means for the answer.\n\n\
            User request: {}\n\n\
            Tasks:\n{}\n\n\
            Execution history:\n{}\n\n\
            Final answer:",
            state.latest_request().unwrap_or(""),
            self.task_summary(&state.tasks),
            Self::history_summary(state)
        )
    }
}

#[async_trait]
impl Component for ReportGenerator {
    fn name(&self) -> &'static str {
        "report"
    }

    async fn run(&self, state: &OrchestrationState) -> StateDelta {
        if route(state) != Destination::Report {
            tracing::warn!("Report requested while executable work remains, ignoring");
            return StateDelta::unchanged();
        }

        let done = StateDelta::unchanged().current(None);

        if state.tasks.is_empty() {
            let already_answered = state
                .last_message()
                .is_some_and(|m| m.role == MessageRole::Assistant);
            return if already_answered {
                done
            } else {
                done.message(Message::assistant(EMPTY_REQUEST_PROMPT))
            };
        }

        if let [task] = state.tasks.as_slice() {
            if task.is_terminal() && is_date_query(task) {
                tracing::info!("Single date/time task, answering with its raw result");
                let raw = task.result().unwrap_or_default().to_string();
                return done.message(Message::assistant(raw));
            }
        }

        match self.generator.generate(&self.build_prompt(state)).await {
            Ok(answer) if !answer.trim().is_empty() => {
                done.message(Message::assistant(answer.trim().to_string()))
            }
            Ok(_) => {
                tracing::warn!("Report generation returned nothing, run ends without an answer");
                done
            }
            Err(e) => {
                tracing::warn!("Report generation failed ({}), run ends without an answer", e);
                done
            }
        }
    }
}
