//! Terminal Core Tool
//!
//! Native execution of allow-listed commands. Execution is routed through
//! `CommandExecutor` for allowlist validation and shell injection prevention,
//! and always runs in a fixed working directory. Captured output is capped
//! at `max_output_chars` before it becomes a task result.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::extract::truncate_chars;
use crate::command_executor::{CommandError, CommandExecutor};
use crate::config::ShellConfig;

/// Outcome of one terminal command, already rendered for the task result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalOutcome {
    pub success: bool,
    pub summary: String,
}

#[derive(Debug, Clone)]
pub struct TerminalTool {
    work_dir: PathBuf,
    timeout: Duration,
    max_output_chars: usize,
    executor: CommandExecutor,
}

impl TerminalTool {
    /// Build a tool that runs commands in the user's home directory
    pub fn new(config: &ShellConfig) -> Self {
        let work_dir = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self::with_work_dir(config, work_dir)
    }

    pub fn with_work_dir(config: &ShellConfig, work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            timeout: Duration::from_secs(config.timeout_secs),
            max_output_chars: config.max_output_chars,
            executor: CommandExecutor::with_allowlist(&config.safe_commands),
        }
    }

    pub fn work_dir(&self) -> &PathBuf {
        &self.work_dir
    }

    /// Execute a command through the secure CommandExecutor
    ///
    /// Never returns an error: rejections, spawn failures, non-zero exits
    /// and timeouts all become an unsuccessful outcome.
    pub async fn execute(&self, command: &str) -> TerminalOutcome {
        info!("Executing terminal command: {}", command);

        match self
            .executor
            .execute(command, &self.work_dir, self.timeout)
            .await
        {
            Ok(output) if output.success() => {
                debug!("Command succeeded");
                TerminalOutcome {
                    success: true,
                    summary: format!(
                        "Command '{}' succeeded:\n\n{}",
                        command,
                        truncate_chars(&output.stdout, self.max_output_chars)
                    ),
                }
            }
            Ok(output) => {
                let code = output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                warn!("Command exited with {}", code);
                TerminalOutcome {
                    success: false,
                    summary: format!(
                        "Command '{}' failed: exit code {}\n{}",
                        command,
                        code,
                        truncate_chars(output.stderr.trim_end(), self.max_output_chars)
                    ),
                }
            }
            Err(e) => {
                match &e {
                    CommandError::Timeout(_) | CommandError::ExecutionFailed(_) => {
                        warn!("Command failed: {}", e)
                    }
                    _ => warn!("Command rejected: {}", e),
                }
                TerminalOutcome {
                    success: false,
                    summary: format!("Command '{}' failed: {}", command, e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> TerminalTool {
        let config = ShellConfig {
            safe_commands: vec!["echo".to_string(), "ls".to_string(), "sleep".to_string()],
            timeout_secs: 1,
            max_output_chars: 20,
        };
        TerminalTool::with_work_dir(&config, std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_success_summary() {
        let outcome = tool().execute("echo hi").await;
        assert!(outcome.success);
        assert_eq!(outcome.summary, "Command 'echo hi' succeeded:\n\nhi\n");
    }

    #[tokio::test]
    async fn test_rejected_command_summary() {
        let outcome = tool().execute("rm -rf /").await;
        assert!(!outcome.success);
        assert!(outcome
            .summary
            .starts_with("Command 'rm -rf /' failed: Command not allowed"));
    }

    #[tokio::test]
    async fn test_long_output_is_capped() {
        let outcome = tool().execute(&format!("echo {}", "x".repeat(100))).await;
        assert!(outcome.success);
        assert_eq!(
            outcome.summary,
            format!("Command 'echo {}' succeeded:\n\n{}...", "x".repeat(100), "x".repeat(20))
        );
    }

    #[tokio::test]
    async fn test_timeout_summary() {
        let outcome = tool().execute("sleep 5").await;
        assert!(!outcome.success);
        assert_eq!(outcome.summary, "Command 'sleep 5' failed: Command timed out after 1s");
    }
}
