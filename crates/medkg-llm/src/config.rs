use std::sync::Arc;

use serde::Deserialize;

use crate::{
    Generator,
    ollama::{DEFAULT_MODEL, OllamaCli, OllamaHttp},
    queue::{DEFAULT_QUEUE_CAPACITY, GenerationQueue},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmBackend {
    /// `ollama run` subprocess per prompt.
    #[default]
    Cli,
    /// Running ollama server.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub model: String,
    /// Program used by the CLI backend.
    pub command: String,
    /// Server address used by the HTTP backend.
    pub base_url: String,
    pub queue_capacity: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Cli,
            model: DEFAULT_MODEL.to_string(),
            command: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl LlmConfig {
    /// Build the configured backend behind a [`GenerationQueue`]. Must be called from within a
    /// tokio runtime.
    pub fn build(&self) -> Arc<dyn Generator> {
        let inner: Arc<dyn Generator> = match self.backend {
            LlmBackend::Cli => Arc::new(OllamaCli::with_command(
                self.command.clone(),
                vec!["run".to_string(), self.model.clone()],
            )),
            LlmBackend::Http => Arc::new(OllamaHttp::new(self.base_url.clone(), self.model.clone())),
        };
        tracing::info!(backend = ?self.backend, model = %self.model, "generator ready");
        Arc::new(GenerationQueue::spawn(inner, self.queue_capacity))
    }
}
