//! Shared helpers for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use taskflow_engine::conductor::Conductor;
use taskflow_engine::config::Config;
use taskflow_engine::llm::{LLMError, Result as LLMResult, TextGenerator};
use taskflow_engine::tools::TerminalTool;

/// Text generator that replays scripted replies in order and records every
/// prompt it receives. Once the script runs out it reports the backend as
/// unavailable.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<LLMResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<LLMResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn unavailable() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> LLMResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LLMError::ProviderUnavailable("script exhausted".to_string())))
    }
}

/// Default configuration with a short command timeout
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.agent.shell.timeout_secs = 10;
    config.agent.web.timeout_secs = 5;
    config
}

/// Conductor whose commands run in `work_dir`
pub fn conductor_in(
    config: &Config,
    generator: Arc<ScriptedGenerator>,
    work_dir: &Path,
) -> Conductor {
    let terminal = TerminalTool::with_work_dir(&config.agent.shell, work_dir.to_path_buf());
    Conductor::with_terminal(config, generator, terminal).unwrap()
}
