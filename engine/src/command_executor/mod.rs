use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// CommandExecutor provides secure command execution with allowlist validation
/// and shell injection prevention.
///
/// # Security Features
/// - Base-command allowlist validation
/// - Shell interpreter rejection (sh, bash, zsh, fish)
/// - Shell metacharacter detection
/// - execve-style execution (no shell)
/// - stdin set to null, stdout/stderr piped
/// - Child killed when the timeout elapses
///
/// An allowlist entry is a whitespace-separated token sequence. A command
/// line is allowed when it equals an entry, starts with an entry's tokens, or
/// its program is the first token of some entry. Matching is on whole
/// tokens: `"ls"` admits `ls -la` but not `lsblk`, and `"python3 --version"`
/// admits `python3 -V`.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    allowlist: Vec<Vec<String>>,
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Command not allowed: {0}")]
    CommandNotAllowed(String),

    #[error("Shell invocation attempt detected")]
    ShellInjectionAttempt,

    #[error("Shell metacharacters detected in argument: {0}")]
    ShellMetacharactersDetected(String),

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Command execution failed: {0}")]
    ExecutionFailed(#[from] std::io::Error),
}

const SHELLS: &[&str] = &["sh", "bash", "zsh", "fish", "dash", "ksh", "csh", "tcsh"];

impl CommandExecutor {
    /// Creates a CommandExecutor with a custom allowlist.
    ///
    /// Blank entries are ignored.
    pub fn with_allowlist<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowlist = commands
            .into_iter()
            .map(|c| tokenize(c.as_ref()))
            .filter(|tokens| !tokens.is_empty())
            .collect();
        Self { allowlist }
    }

    /// Adds a command to the allowlist.
    pub fn allow_command(&mut self, command: &str) {
        let tokens = tokenize(command);
        if !tokens.is_empty() {
            self.allowlist.push(tokens);
        }
    }

    /// Whether `argv` matches some allowlist entry exactly, by token
    /// prefix, or by base command
    pub fn is_allowed(&self, argv: &[String]) -> bool {
        let Some(program) = argv.first() else {
            return false;
        };
        self.allowlist.iter().any(|entry| {
            argv.starts_with(entry) || entry.first().is_some_and(|base| base == program)
        })
    }

    /// Validates a command line through all security gates without executing it.
    ///
    /// Returns the argument vector to execute.
    ///
    /// # Security Gates
    /// 1. Reject shell interpreters
    /// 2. Validate command is in allowlist
    /// 3. Check for shell metacharacters in arguments
    pub fn validate(&self, command_line: &str) -> Result<Vec<String>, CommandError> {
        let argv = tokenize(command_line);
        let Some(program) = argv.first() else {
            return Err(CommandError::EmptyCommand);
        };

        // Gate 1: Reject shell invocation patterns
        if SHELLS.contains(&program.as_str()) {
            return Err(CommandError::ShellInjectionAttempt);
        }

        // Gate 2: Validate command is in allowlist
        if !self.is_allowed(&argv) {
            return Err(CommandError::CommandNotAllowed(command_line.trim().to_string()));
        }

        // Gate 3: Check for shell metacharacters in any token
        for arg in &argv {
            if has_shell_metacharacters(arg) {
                return Err(CommandError::ShellMetacharactersDetected(arg.clone()));
            }
        }

        Ok(argv)
    }

    /// Validates and executes a command line.
    ///
    /// No subprocess is spawned unless every gate passes. The child runs in
    /// `cwd` with stdin closed and is killed if `timeout` elapses.
    pub async fn execute(
        &self,
        command_line: &str,
        cwd: &Path,
        timeout: Duration,
    ) -> Result<CommandOutput, CommandError> {
        let argv = self.validate(command_line)?;

        let child = Command::new(&argv[0])
            .args(&argv[1..])
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(CommandError::Timeout(timeout)),
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Split a command line into its argument vector
pub fn tokenize(command_line: &str) -> Vec<String> {
    command_line.split_whitespace().map(str::to_string).collect()
}

/// Checks if a string contains shell metacharacters.
///
/// Detects: | & ; ' " ` $ \n < >
fn has_shell_metacharacters(s: &str) -> bool {
    s.chars()
        .any(|c| matches!(c, '|' | '&' | ';' | '\'' | '"' | '`' | '$' | '\n' | '<' | '>'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> CommandExecutor {
        CommandExecutor::with_allowlist(["ls", "echo", "date", "python --version"])
    }

    #[test]
    fn test_token_boundary_matching() {
        let executor = executor();
        assert!(executor.validate("ls").is_ok());
        assert!(executor.validate("ls -la /tmp").is_ok());
        assert!(matches!(
            executor.validate("lsblk"),
            Err(CommandError::CommandNotAllowed(_))
        ));
        assert!(executor.validate("python --version").is_ok());
        assert!(matches!(
            executor.validate("pythonw --version"),
            Err(CommandError::CommandNotAllowed(_))
        ));
    }

    #[test]
    fn test_base_command_token_admits_other_arguments() {
        let executor = executor();
        assert!(executor.validate("python -V").is_ok());
        assert!(executor.validate("date +%Y").is_ok());
        // Gate 3 still applies to base-token matches
        assert!(matches!(
            executor.validate("python -c $HOME"),
            Err(CommandError::ShellMetacharactersDetected(_))
        ));
    }

    #[test]
    fn test_timeout_message_keeps_subsecond_precision() {
        let err = CommandError::Timeout(Duration::from_millis(200));
        assert_eq!(err.to_string(), "Command timed out after 200ms");
    }

    #[test]
    fn test_disallowed_command_rejected() {
        let result = executor().validate("rm -rf /");
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[test]
    fn test_shell_invocation_rejected() {
        let mut executor = executor();
        executor.allow_command("bash");
        let result = executor.validate("bash -c ls");
        assert!(matches!(result, Err(CommandError::ShellInjectionAttempt)));
    }

    #[test]
    fn test_shell_metacharacters_detected() {
        let executor = executor();

        for line in ["ls |cat", "ls ;rm", "echo `whoami`", "echo $HOME", "ls >out"] {
            assert!(
                matches!(
                    executor.validate(line),
                    Err(CommandError::ShellMetacharactersDetected(_))
                ),
                "{} should be rejected",
                line
            );
        }
    }

    #[test]
    fn test_empty_command() {
        assert!(matches!(
            executor().validate("   "),
            Err(CommandError::EmptyCommand)
        ));
    }

    #[tokio::test]
    async fn test_allowed_command_executes() {
        let cwd = std::env::temp_dir();
        let output = executor()
            .execute("echo hello world", &cwd, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello world");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_captured() {
        let cwd = std::env::temp_dir();
        let output = executor()
            .execute("ls /definitely/not/a/real/path", &cwd, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(!output.success());
        assert!(!output.stderr.is_empty());
    }
}
