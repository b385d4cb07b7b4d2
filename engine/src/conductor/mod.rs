//! Conductor System
//!
//! The task orchestration state machine: planning, routing, execution,
//! validation and reporting over a per-request `OrchestrationState`.

use async_trait::async_trait;

pub mod executor;
pub mod graph;
pub mod memory;
pub mod planner;
pub mod report;
pub mod router;
pub mod state;
pub mod validator;

pub use executor::{NetworkFetchExecutor, ShellCommandExecutor};
pub use graph::{Conductor, RunOutcome};
pub use memory::WorkingMemory;
pub use planner::Planner;
pub use report::ReportGenerator;
pub use router::{route, Destination};
pub use state::{OrchestrationState, StateDelta};
pub use validator::Validator;

/// A node of the orchestration graph
///
/// `run` reads the state and returns only the fields it changed. It never
/// fails: problems are recorded in the returned delta.
#[async_trait]
pub trait Component: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, state: &OrchestrationState) -> StateDelta;
}
