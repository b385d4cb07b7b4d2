// Taskflow task orchestrator
// Main entry point for the taskflow binary

use anyhow::Context;
use clap::Parser;
use taskflow_engine::cli::{Cli, Command, ConfigAction};
use taskflow_engine::config::Config;
use taskflow_engine::handlers::{
    handle_chat, handle_config_path, handle_config_show, handle_doctor, handle_run, OutputFormat,
};
use taskflow_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };

    let config = if cli.config.is_some() {
        Config::load_from_path(&config_path)
    } else {
        Config::load_or_create()
    }
    .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!(
        "Taskflow v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Command::Run { request } => handle_run(request, &config, format).await,
        Command::Chat => handle_chat(&config, format).await,
        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(&config_path, format),
        },
        Command::Doctor => handle_doctor(&config, format).await,
    }
}
