//! Command handlers
//!
//! One function per CLI command. Answers go to stdout; logs go to stderr.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::conductor::{Conductor, RunOutcome};
use crate::config::Config;
use crate::llm::create_generator;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Words that end an interactive session
const EXIT_WORDS: &[&str] = &["exit", "quit", "退出"];

/// Shown when a run ends without an answer
const NO_ANSWER: &str = "No answer could be generated. Check that the text generator is reachable.";

fn build_conductor(config: &Config) -> Result<Conductor> {
    let generator = create_generator(&config.llm).context("Failed to create text generator")?;
    tracing::debug!("Using text generator '{}'", generator.name());
    Conductor::new(config, generator).context("Failed to build conductor")
}

fn print_outcome(outcome: &RunOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", outcome.answer.as_deref().unwrap_or(NO_ANSWER));
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "request_id": outcome.request_id,
                "answer": outcome.answer,
                "tasks": outcome.state.tasks,
                "execution_history": outcome.state.execution_history,
                "duration_ms": outcome.duration_ms,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json).context("Failed to serialize outcome")?
            );
        }
    }
    Ok(())
}

/// Process one request and print its answer
pub async fn handle_run(request: String, config: &Config, format: OutputFormat) -> Result<()> {
    let conductor = build_conductor(config)?;
    let outcome = conductor.run(&request).await;
    print_outcome(&outcome, format)
}

/// Interactive loop: every line is an independent request
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let conductor = build_conductor(config)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if format == OutputFormat::Text {
        println!("Taskflow interactive session. Type 'exit' or 'quit' to leave.");
    }

    loop {
        if format == OutputFormat::Text {
            print!("You: ");
            std::io::stdout().flush().context("Failed to flush stdout")?;
        }

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();

        if EXIT_WORDS.iter().any(|w| line.eq_ignore_ascii_case(w)) {
            break;
        }
        if line.is_empty() {
            continue;
        }

        let outcome = conductor.run(line).await;
        if format == OutputFormat::Text {
            print!("Assistant: ");
        }
        print_outcome(&outcome, format)?;
    }

    if format == OutputFormat::Text {
        println!("Goodbye.");
    }
    Ok(())
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(config).context("Failed to serialize config")?
        ),
    }
    Ok(())
}

/// Print the configuration file path
pub fn handle_config_path(path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", serde_json::json!({ "path": path })),
    }
    Ok(())
}

/// Run system diagnostics
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut checks: Vec<(String, String)> = Vec::new();
    let mut issues = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration".to_string(), "Valid".to_string()));

    match create_generator(&config.llm) {
        Ok(generator) => {
            let healthy = generator.check_health().await;
            checks.push((
                format!("Text generator ({})", generator.name()),
                if healthy { "Available" } else { "Unavailable" }.to_string(),
            ));
            if !healthy {
                issues.push(format!(
                    "Text generator '{}' is not reachable. Planning and reports will use fallbacks.",
                    generator.name()
                ));
            }
        }
        Err(e) => {
            checks.push(("Text generator".to_string(), "Misconfigured".to_string()));
            issues.push(e.to_string());
        }
    }

    let work_dir = dirs::home_dir();
    checks.push((
        "Command working directory".to_string(),
        work_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Missing".to_string()),
    ));
    if work_dir.is_none() {
        issues.push("Home directory not found; commands will run in the temp directory".to_string());
    }

    checks.push((
        "Allowed commands".to_string(),
        config.agent.shell.safe_commands.join(", "),
    ));

    match format {
        OutputFormat::Text => {
            println!("Taskflow diagnostics");
            for (name, status) in &checks {
                println!("  {:<28} {}", name, status);
            }
            if issues.is_empty() {
                println!("\nNo issues found.");
            } else {
                println!("\nIssues:");
                for issue in &issues {
                    println!("  - {}", issue);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "checks": checks
                    .iter()
                    .map(|(name, status)| serde_json::json!({ "name": name, "status": status }))
                    .collect::<Vec<_>>(),
                "issues": issues,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
