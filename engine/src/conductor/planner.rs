//! Conductor Planner
//!
//! Turns the latest user request into the run's task list. Trivial date and
//! time questions skip generation; everything else asks the text generator
//! for a JSON array of `{type, description, parameters}` objects.

use async_trait::async_trait;
use regex::Regex;
use sdk::types::{Task, TaskKind, TaskParameters};
use serde::Deserialize;
use std::sync::Arc;

use super::memory::WorkingMemory;
use super::state::{OrchestrationState, StateDelta};
use super::Component;
use crate::command_executor::tokenize;
use crate::llm::{LLMError, Message, TextGenerator};

/// Reply when there is nothing to plan
pub const EMPTY_REQUEST_PROMPT: &str = "Please enter a request so I can plan the work.";

const DATE_COMMAND: &str = "date";
const DATE_DESCRIPTION: &str = "Get the current date and time";
const DIAGNOSTIC_COMMAND: &str = "uname -a";
const DIAGNOSTIC_DESCRIPTION: &str = "Collect basic system information";

const FAST_PATH_PATTERNS: &[&str] = &[
    r"(?i)\bwhat\s+time\s+is\s+it\b",
    r"(?i)\bwhat('|’)?s\s+the\s+(time|date)\b",
    r"(?i)\bwhat\s+is\s+the\s+(time|date)\b",
    r"(?i)\bcurrent\s+(time|date)\b",
    r"(?i)\btoday('|’)?s\s+date\b",
    r"(?i)\bwhat\s+day\s+is\s+(it|today)\b",
    r"日期",
    r"时间",
];

/// Whether a task is the date/time query the fast path produces
///
/// Matches shell-command tasks whose command's first token is `date`.
pub fn is_date_query(task: &Task) -> bool {
    task.kind() == TaskKind::ShellCommand
        && task
            .param_str("command")
            .and_then(|c| tokenize(c).into_iter().next())
            .is_some_and(|program| program == DATE_COMMAND)
}

/// Intermediate deserialization type for generator JSON output
#[derive(Debug, Deserialize)]
struct RawTask {
    #[serde(rename = "type")]
    kind: String,
    description: String,
    #[serde(default)]
    parameters: TaskParameters,
}

pub struct Planner {
    generator: Arc<dyn TextGenerator>,
    fast_path: Vec<Regex>,
    fenced_block: Regex,
    trailing_comma: Regex,
}

impl Planner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Result<Self, regex::Error> {
        let fast_path = FAST_PATH_PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            generator,
            fast_path,
            fenced_block: Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```")?,
            trailing_comma: Regex::new(r",(\s*[}\]])")?,
        })
    }

    pub fn is_fast_path(&self, request: &str) -> bool {
        self.fast_path.iter().any(|re| re.is_match(request))
    }

    /// Build the task list for a request
    ///
    /// Never fails: generation problems fall back to a diagnostic task and
    /// unparseable output to a single reflect task.
    pub async fn plan(&self, request: &str) -> Vec<Task> {
        if self.is_fast_path(request) {
            tracing::info!("Date/time request, skipping generation");
            return vec![Task::with_param(
                TaskKind::ShellCommand,
                DATE_DESCRIPTION,
                "command",
                DATE_COMMAND,
            )];
        }

        let output = match self.generator.generate(&self.build_prompt(request)).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => return self.diagnostic_plan(&LLMError::EmptyResponse),
            Err(e) => return self.diagnostic_plan(&e),
        };

        match self.parse_tasks(&output) {
            Some(tasks) => tasks,
            None => {
                tracing::warn!("Failed to parse plan output, falling back to a reflect task");
                vec![Task::new(
                    TaskKind::Reflect,
                    format!("Analyze the user request: {}", request),
                    TaskParameters::new(),
                )]
            }
        }
    }

    fn diagnostic_plan(&self, error: &LLMError) -> Vec<Task> {
        tracing::warn!("Plan generation failed ({}), using diagnostic task", error);
        vec![Task::with_param(
            TaskKind::ShellCommand,
            DIAGNOSTIC_DESCRIPTION,
            "command",
            DIAGNOSTIC_COMMAND,
        )]
    }

    fn build_prompt(&self, request: &str) -> String {
        format!(
            "You are a task planner. Break the user's request into a short, ordered list of sub-tasks.\n\
            Each sub-task has a \"type\", a \"description\" and \"parameters\". Available types:\n\
            - \"network-fetch\": fetch a web page. parameters: {{\"url\": \"https://...\"}}\n\
            - \"shell-command\": run a simple read-only command. parameters: {{\"command\": \"ls\"}}\n\
            - \"code\": write or explain code. parameters: {{}}\n\
            - \"reflect\": reason about or summarize the information gathered. parameters: {{}}\n\n\
            Respond with a JSON array inside a ```json block, for example:\n\
            ```json\n\
            [{{\"type\": \"network-fetch\", \"description\": \"Read the Rust homepage\", \"parameters\": {{\"url\": \"https://www.rust-lang.org\"}}}},\n \
            {{\"type\": \"reflect\", \"description\": \"Summarize what was found\", \"parameters\": {{}}}}]\n\
            ```\n\n\
            User request: {}",
            request
        )
    }

    /// Parse generator output into fresh pending tasks
    ///
    /// Returns `None` when no non-empty, well-formed array is found.
    fn parse_tasks(&self, content: &str) -> Option<Vec<Task>> {
        let trimmed = content.trim();

        let json_str = match self.fenced_block.captures(trimmed).and_then(|c| c.get(1)) {
            Some(block) => block.as_str().trim(),
            None => match (trimmed.find('['), trimmed.rfind(']')) {
                (Some(start), Some(end)) if start < end => &trimmed[start..=end],
                _ => trimmed,
            },
        };

        let cleaned = self.trailing_comma.replace_all(json_str, "$1");

        let raw: Vec<RawTask> = match serde_json::from_str(&cleaned) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("Plan JSON rejected: {}", e);
                return None;
            }
        };

        if raw.is_empty() {
            return None;
        }

        Some(
            raw.into_iter()
                .map(|r| Task::new(TaskKind::from_label(&r.kind), r.description, r.parameters))
                .collect(),
        )
    }

    fn plan_message(tasks: &[Task]) -> String {
        if let [only] = tasks {
            if is_date_query(only) {
                return "I'll check the current date and time for you.".to_string();
            }
        }

        let mut message = format!("I split your request into {} sub-tasks:", tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            message.push_str(&format!("\n{}. {} ({})", i + 1, task.description(), task.kind()));
        }
        message
    }
}

#[async_trait]
impl Component for Planner {
    fn name(&self) -> &'static str {
        "planner"
    }

    async fn run(&self, state: &OrchestrationState) -> StateDelta {
        let request = state
            .latest_request()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let Some(request) = request else {
            tracing::info!("No user request to plan");
            return StateDelta::unchanged()
                .message(Message::assistant(EMPTY_REQUEST_PROMPT))
                .tasks(Vec::new())
                .current(None)
                .awaiting(None)
                .working_memory(WorkingMemory::new())
                .history(Vec::new());
        };

        let tasks = self.plan(request).await;
        tracing::info!("Planned {} task(s)", tasks.len());

        StateDelta::unchanged()
            .message(Message::assistant(Self::plan_message(&tasks)))
            .current(tasks.first().map(|t| t.id().to_string()))
            .tasks(tasks)
            .awaiting(None)
            .working_memory(WorkingMemory::new())
            .history(Vec::new())
    }
}
