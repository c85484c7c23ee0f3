/// Failures that abort the whole request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FatalError {
    #[error("Embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),
}
