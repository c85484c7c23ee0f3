//! Question embedding.
//!
//! [`Embedder`] is the seam the orchestrator depends on. [`EmbeddingProcessor`] dispatches to
//! either the in-process candle model ([`local::LocalEmbedder`]) or a remote Hugging Face
//! endpoint, and checks that every vector has the configured dimensionality.
pub mod config;
pub mod error;
pub mod local;
pub mod processor;
pub mod providers;

use async_trait::async_trait;
use medkg_core::QuestionEmbedding;

pub use error::EmbedError;
pub use processor::{EmbeddingProcessor, EmbeddingSource};

#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Embed a single question. Deterministic for a fixed model.
    async fn embed(&self, text: &str) -> Result<QuestionEmbedding, EmbedError>;

    fn dimensions(&self) -> usize;
}
