//! Conductor Validator
//!
//! Judges each finished task with the text generator and advances the
//! execution frontier. It never changes a task's own status or result.
//!
//! Date/time queries are self-validating: the validator records the skip
//! and ends the run by clearing `current_task_id`, even if other tasks are
//! still pending.

use async_trait::async_trait;
use sdk::types::{HistoryAction, HistoryEntry, Task};
use std::sync::Arc;

use super::planner::is_date_query;
use super::state::{first_pending, OrchestrationState, StateDelta};
use super::Component;
use crate::config::ValidatorConfig;
use crate::llm::{LLMError, TextGenerator};
use crate::tools::truncate_chars;

pub struct Validator {
    generator: Arc<dyn TextGenerator>,
    preview_chars: usize,
}

impl Validator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &ValidatorConfig) -> Self {
        Self {
            generator,
            preview_chars: config.preview_chars,
        }
    }

    /// The finished task to judge: the one awaiting validation, else the
    /// current task when it is already terminal
    fn target<'a>(&self, state: &'a OrchestrationState) -> Option<&'a Task> {
        state
            .awaiting_validation
            .as_deref()
            .and_then(|id| state.find_task(id))
            .filter(|t| t.is_terminal())
            .or_else(|| state.current_task().filter(|t| t.is_terminal()))
    }

    fn build_prompt(task: &Task) -> String {
        format!(
            "Review the outcome of this task and say briefly whether it achieved its goal.\n\
            Task: {}\n\
            Type: {}\n\
            Status: {}\n\
            Result:\n{}",
            task.description(),
            task.kind(),
            task.status(),
            task.result().unwrap_or("(no result)")
        )
    }

    async fn verdict(&self, task: &Task) -> Result<String, LLMError> {
        let text = self.generator.generate(&Self::build_prompt(task)).await?;
        if text.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl Component for Validator {
    fn name(&self) -> &'static str {
        "validator"
    }

    async fn run(&self, state: &OrchestrationState) -> StateDelta {
        let Some(task) = self.target(state) else {
            return StateDelta::unchanged();
        };

        if is_date_query(task) {
            tracing::info!("Skipping validation for date/time task {}", task.id());
            let history = state.history_with(HistoryEntry::new(
                task.id(),
                HistoryAction::Validation,
                "skipped: date/time query is self-validating",
            ));
            return StateDelta::unchanged()
                .history(history)
                .current(None)
                .awaiting(None);
        }

        let mut delta = StateDelta::unchanged();
        let entry = match self.verdict(task).await {
            Ok(verdict) => {
                let mut memory = state.working_memory.clone();
                memory.record_validation(task.id(), verdict.clone());
                delta = delta.working_memory(memory);
                HistoryEntry::new(
                    task.id(),
                    HistoryAction::Validation,
                    truncate_chars(&verdict, self.preview_chars),
                )
            }
            Err(e) => {
                tracing::warn!("Validation of task {} failed: {}", task.id(), e);
                HistoryEntry::new(task.id(), HistoryAction::ValidationError, e.to_string())
            }
        };

        delta
            .history(state.history_with(entry))
            .current(first_pending(&state.tasks))
            .awaiting(None)
    }
}
