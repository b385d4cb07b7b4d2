//! Conductor Router
//!
//! Pure decision function selecting the component that runs next.

use sdk::types::TaskKind;
use std::fmt;

use super::state::OrchestrationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    NetworkFetch,
    ShellCommand,
    Report,
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkFetch => write!(f, "network_fetch"),
            Self::ShellCommand => write!(f, "shell_command"),
            Self::Report => write!(f, "report"),
        }
    }
}

/// Select the next component for `state`
///
/// A missing or dangling `current_task_id` means there is no actionable
/// work. Kinds without an executor go straight to the report.
pub fn route(state: &OrchestrationState) -> Destination {
    let Some(task) = state.current_task() else {
        return Destination::Report;
    };

    match task.kind() {
        TaskKind::NetworkFetch => Destination::NetworkFetch,
        TaskKind::ShellCommand => Destination::ShellCommand,
        TaskKind::Code | TaskKind::Reflect => Destination::Report,
    }
}
