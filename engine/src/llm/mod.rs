//! Text Generation Abstraction Layer
//!
//! This module provides a common interface for the text generation backends
//! (Ollama, Gemini). The planner, validator and report generator depend only
//! on the `TextGenerator` trait, so tests can swap in a scripted generator.
//!
//! It also defines `Message`, the entry type of the user-visible conversation
//! log kept in the orchestration state.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LLMConfig;

pub mod gemini;
pub mod ollama;

/// Result type for text generation
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during text generation
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Empty response")]
    EmptyResponse,
}

/// Message in the conversation log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Text generator trait that all backends must implement
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the name of the backend (e.g., "ollama", "gemini")
    fn name(&self) -> &str;

    /// Produce text for a prompt
    ///
    /// # Returns
    /// * `Ok(String)` - The generated text, possibly blank
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the backend is currently reachable.
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Build the configured text generator
///
/// # Errors
///
/// Returns `EngineError::Config` for an unknown `client_type`, and
/// `EngineError::LLMProvider` when the HTTP client cannot be built.
pub fn create_generator(config: &LLMConfig) -> std::result::Result<Arc<dyn TextGenerator>, EngineError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.client_type.as_str() {
        "ollama" => {
            let provider = ollama::OllamaProvider::new(
                config.ollama.base_url.clone(),
                config.ollama.model.clone(),
                timeout,
            )
            .map_err(|e| EngineError::LLMProvider(e.to_string()))?;
            Ok(Arc::new(provider))
        }
        "gemini" => {
            if config.gemini.resolve_api_key().is_none() {
                return Err(EngineError::Config(format!(
                    "Gemini selected but no API key found. Set llm.gemini.api_key or {}",
                    crate::config::GEMINI_API_KEY_ENV
                )));
            }
            let provider = gemini::GeminiProvider::new(config.gemini.clone(), timeout)
                .map_err(|e| EngineError::LLMProvider(e.to_string()))?;
            Ok(Arc::new(provider))
        }
        other => Err(EngineError::Config(format!(
            "Unsupported client type '{}'",
            other
        ))),
    }
}

/// Build the shared HTTP client for a backend
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LLMError::NetworkError(format!("Failed to create HTTP client: {}", e)))
}

/// Map a transport failure to an `LLMError`
pub(crate) fn map_request_error(e: reqwest::Error, backend: &str, base_url: &str) -> LLMError {
    if e.is_timeout() {
        LLMError::Timeout
    } else if e.is_connect() {
        LLMError::ProviderUnavailable(format!(
            "Cannot connect to {} at {}. Is it running?",
            backend, base_url
        ))
    } else {
        LLMError::NetworkError(e.to_string())
    }
}
