//! Text generation for medkg.
//!
//! Everything the orchestrator needs from a language model is [`Generator::generate`]: one
//! prompt in, one completion out. Transport lives behind it: an `ollama run` subprocess
//! ([`OllamaCli`]), the ollama HTTP API ([`OllamaHttp`]), and the [`GenerationQueue`] that
//! serialises access to either.
pub mod config;
mod error;
pub mod ollama;
pub mod queue;

use std::time::Duration;

use async_trait::async_trait;

pub use config::{LlmBackend, LlmConfig};
pub use error::LlmError;
pub use ollama::{OllamaCli, OllamaHttp};
pub use queue::GenerationQueue;

#[async_trait]
pub trait Generator: Send + Sync + std::fmt::Debug {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// [`generate`](Generator::generate) with `limit` bounding the model's own work. Generators
    /// that queue prompts start the clock when the prompt is picked up, not when it is sent.
    async fn generate_within(&self, prompt: &str, limit: Duration) -> Result<String, LlmError> {
        tokio::time::timeout(limit, self.generate(prompt))
            .await
            .map_err(|_| LlmError::Timeout(limit.as_secs()))?
    }
}
