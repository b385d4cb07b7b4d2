//! Configuration management
//!
//! This module handles loading, validation, and management of the Taskflow configuration.
//! Configuration is stored in TOML format at ~/.taskflow/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level
//! - **llm**: Text generation backend selection and provider settings
//! - **agent**: Executor, validator and report tuning (allow-list, timeouts, budgets)
//!
//! Every field has a default, so a partial file (or an empty one) is valid.
//! The loaded `Config` is never mutated afterwards: it is handed to each
//! component at construction time.
//!
//! # Examples
//!
//! ```no_run
//! use taskflow_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Generator: {}", config.llm.client_type);
//! println!("Allowed commands: {:?}", config.agent.shell.safe_commands);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `llm.gemini.api_key` is empty
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Text generation configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Orchestration component settings
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Text generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Backend to use (ollama, gemini)
    #[serde(default = "default_client_type")]
    pub client_type: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Gemini provider settings
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            client_type: default_client_type(),
            timeout_secs: default_llm_timeout(),
            ollama: OllamaConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_ollama_model(),
        }
    }
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API key; falls back to the GEMINI_API_KEY environment variable when empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            api_key: None,
        }
    }
}

impl GeminiConfig {
    /// Resolve the API key from config, then the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(GEMINI_API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Orchestration component settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub shell: ShellConfig,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub validator: ValidatorConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Shell-command executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Allow-listed commands. An entry may carry arguments (`"python --version"`).
    #[serde(default = "default_safe_commands")]
    pub safe_commands: Vec<String>,

    /// Command timeout in seconds
    #[serde(default = "default_executor_timeout")]
    pub timeout_secs: u64,

    /// Maximum characters of stdout/stderr kept in a task result
    #[serde(default = "default_max_content_chars")]
    pub max_output_chars: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            safe_commands: default_safe_commands(),
            timeout_secs: default_executor_timeout(),
            max_output_chars: default_max_content_chars(),
        }
    }
}

/// Network-fetch executor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Request timeout in seconds
    #[serde(default = "default_executor_timeout")]
    pub timeout_secs: u64,

    /// Maximum characters of extracted page text kept in a task result
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// User-Agent header sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_executor_timeout(),
            max_content_chars: default_max_content_chars(),
            user_agent: default_user_agent(),
        }
    }
}

/// Validator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Characters of a verdict kept in the execution history
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
        }
    }
}

/// Report generator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Characters of each task result shown in the report prompt
    #[serde(default = "default_preview_chars")]
    pub result_preview_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            result_preview_chars: default_preview_chars(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_client_type() -> String {
    "ollama".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_safe_commands() -> Vec<String> {
    [
        "ls",
        "pwd",
        "echo",
        "cat",
        "find",
        "python --version",
        "python3 --version",
        "date",
        "whoami",
        "hostname",
        "uname",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_executor_timeout() -> u64 {
    30
}

fn default_max_content_chars() -> usize {
    5000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 AI Research Agent".to_string()
}

fn default_preview_chars() -> usize {
    100
}

impl Config {
    /// Load configuration from the default location (~/.taskflow/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, TOML parsing
    /// fails, or validation fails.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();
        config.validate()?;

        fs::write(path, config.to_toml()?)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Created default configuration at {}", path.display());

        Ok(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Get the default configuration file path (~/.taskflow/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".taskflow").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_clients = ["ollama", "gemini"];
        if !valid_clients.contains(&self.llm.client_type.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid client type '{}'. Must be one of: {}",
                self.llm.client_type,
                valid_clients.join(", ")
            )));
        }

        if self.llm.timeout_secs == 0
            || self.agent.shell.timeout_secs == 0
            || self.agent.web.timeout_secs == 0
        {
            return Err(EngineError::Config(
                "timeout_secs values must be greater than zero".to_string(),
            ));
        }

        if self
            .agent
            .shell
            .safe_commands
            .iter()
            .all(|c| c.trim().is_empty())
        {
            return Err(EngineError::Config(
                "agent.shell.safe_commands must contain at least one command".to_string(),
            ));
        }

        if self.agent.web.max_content_chars == 0 {
            return Err(EngineError::Config(
                "agent.web.max_content_chars must be greater than zero".to_string(),
            ));
        }

        if self.agent.shell.max_output_chars == 0 {
            return Err(EngineError::Config(
                "agent.shell.max_output_chars must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.llm.client_type, "ollama");
        assert_eq!(config.agent.shell.timeout_secs, 30);
        assert_eq!(config.agent.web.max_content_chars, 5000);
        assert_eq!(config.agent.shell.max_output_chars, 5000);
        assert!(config.agent.shell.safe_commands.contains(&"date".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.llm.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.agent.validator.preview_chars, 100);
    }

    #[test]
    fn test_invalid_client_type_rejected() {
        let result = Config::from_toml_str("[llm]\nclient_type = \"mystery\"\n");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_empty_allowlist_rejected() {
        let result = Config::from_toml_str("[agent.shell]\nsafe_commands = []\n");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::from_toml_str("[agent.web]\ntimeout_secs = 0\n");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_zero_output_budget_rejected() {
        let result = Config::from_toml_str("[agent.shell]\nmax_output_chars = 0\n");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = config.to_toml().unwrap();

        let deserialized = Config::from_toml_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(
            config.agent.shell.safe_commands,
            deserialized.agent.shell.safe_commands
        );
    }
}
