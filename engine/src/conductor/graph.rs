//! Conductor Graph
//!
//! Drives one request through the components:
//!
//! 1. Planner builds the task list
//! 2. Router picks an executor for the current task, or the report
//! 3. Executor runs the task, Validator judges it, back to 2
//! 4. ReportGenerator produces the answer
//!
//! Every component output is folded into the state with `apply`. A step cap
//! of `2 * tasks + 4` component calls guards against a loop that stops
//! making progress.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use super::executor::{NetworkFetchExecutor, ShellCommandExecutor};
use super::planner::Planner;
use super::report::ReportGenerator;
use super::router::{route, Destination};
use super::state::{OrchestrationState, StateDelta};
use super::validator::Validator;
use super::Component;
use crate::config::Config;
use crate::llm::{MessageRole, TextGenerator};
use crate::tools::{TerminalTool, WebFetcher};
use sdk::errors::EngineError;

/// Result of one request
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub request_id: String,

    /// Final assistant message; `None` when report generation was unavailable
    pub answer: Option<String>,

    /// Final state, for inspection
    pub state: OrchestrationState,

    pub duration_ms: u64,
}

pub struct Conductor {
    planner: Planner,
    network_fetch: NetworkFetchExecutor,
    shell_command: ShellCommandExecutor,
    validator: Validator,
    report: ReportGenerator,
}

impl Conductor {
    /// Build a conductor from configuration and a text generator
    pub fn new(config: &Config, generator: Arc<dyn TextGenerator>) -> Result<Self, EngineError> {
        let terminal = TerminalTool::new(&config.agent.shell);
        Self::with_terminal(config, generator, terminal)
    }

    /// Build a conductor whose shell commands run through `terminal`
    pub fn with_terminal(
        config: &Config,
        generator: Arc<dyn TextGenerator>,
        terminal: TerminalTool,
    ) -> Result<Self, EngineError> {
        let planner = Planner::new(generator.clone())
            .map_err(|e| EngineError::Config(format!("Invalid planner pattern: {}", e)))?;
        let fetcher = WebFetcher::new(&config.agent.web)
            .map_err(|e| EngineError::Network(e.to_string()))?;

        Ok(Self {
            planner,
            network_fetch: NetworkFetchExecutor::new(fetcher),
            shell_command: ShellCommandExecutor::new(terminal),
            validator: Validator::new(generator.clone(), &config.agent.validator),
            report: ReportGenerator::new(generator, &config.agent.report),
        })
    }

    /// Process one user request to completion
    pub async fn run(&self, request: &str) -> RunOutcome {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("run", request_id = %request_id);

        async {
            let start = Instant::now();
            info!("Starting request: {}", request);

            let mut state = OrchestrationState::new(request);
            state = self.step(&self.planner, state).await;

            let max_steps = 2 * state.tasks.len() + 4;
            let mut steps = 1;

            loop {
                let destination = route(&state);
                debug!("Routing to {}", destination);

                let executor: &dyn Component = match destination {
                    Destination::Report => break,
                    Destination::NetworkFetch => &self.network_fetch,
                    Destination::ShellCommand => &self.shell_command,
                };

                if steps + 2 > max_steps {
                    error!(
                        "Step limit of {} reached with {} pending task(s), forcing report",
                        max_steps,
                        state.pending_count()
                    );
                    state = state.apply(StateDelta::unchanged().current(None));
                    break;
                }

                state = self.step(executor, state).await;
                state = self.step(&self.validator, state).await;
                steps += 2;
            }

            let report_delta = self.invoke(&self.report, &state).await;
            let answer = report_delta
                .messages
                .last()
                .map(|m| m.content.clone())
                .or_else(|| {
                    // A run with no tasks already answered from the planner
                    state
                        .tasks
                        .is_empty()
                        .then(|| state.last_message())
                        .flatten()
                        .filter(|m| m.role == MessageRole::Assistant)
                        .map(|m| m.content.clone())
                });
            state = state.apply(report_delta);

            let duration_ms = start.elapsed().as_millis() as u64;
            info!(
                "Request finished in {}ms: {} task(s), answered: {}",
                duration_ms,
                state.tasks.len(),
                answer.is_some()
            );

            RunOutcome {
                request_id: request_id.clone(),
                answer,
                state,
                duration_ms,
            }
        }
        .instrument(span)
        .await
    }

    async fn invoke(&self, component: &dyn Component, state: &OrchestrationState) -> StateDelta {
        let span = info_span!("component", name = component.name());
        component.run(state).instrument(span).await
    }

    async fn step(&self, component: &dyn Component, state: OrchestrationState) -> OrchestrationState {
        let delta = self.invoke(component, &state).await;
        state.apply(delta)
    }
}
