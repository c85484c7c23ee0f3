#![allow(missing_docs)]
//! Error types for medkg-rag.
//!
//! [`RagError`] is the failure taxonomy of a hybrid request. Only the two vector-channel
//! prerequisites are fatal; everything else stays inside the channel that produced it and is
//! reported next to that channel's answer.
use medkg_core::rag_types::Modality;
use medkg_error::{FatalError, Severity, WarningError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Query translation failed: {0}")]
    TranslationFailure(String),

    #[error("Generated query rejected, contains mutating keyword `{keyword}`")]
    UnsafeQuery { keyword: String, query: String },

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("Answer generation failed for {channel} channel: {message}")]
    GenerationFailure { channel: Modality, message: String },
}

impl RagError {
    /// Whether the failure aborts the whole request rather than one channel.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RagError::EmbeddingUnavailable(_) | RagError::IndexUnavailable(_)
        )
    }

    pub fn severity(&self) -> Severity {
        if self.is_fatal() {
            Severity::Fatal
        } else {
            Severity::Warning
        }
    }
}

impl From<RagError> for medkg_error::Error {
    fn from(value: RagError) -> medkg_error::Error {
        match value {
            RagError::EmbeddingUnavailable(msg) => FatalError::EmbeddingUnavailable(msg).into(),
            RagError::IndexUnavailable(msg) => FatalError::IndexUnavailable(msg).into(),
            RagError::TranslationFailure(msg) => WarningError::TranslationFailure(msg).into(),
            RagError::UnsafeQuery { keyword, query } => {
                WarningError::UnsafeQuery { keyword, query }.into()
            }
            RagError::QueryExecution(msg) => WarningError::QueryExecution(msg).into(),
            RagError::GenerationFailure { channel, message } => WarningError::GenerationFailure {
                channel: channel.to_string(),
                message,
            }
            .into(),
        }
    }
}
