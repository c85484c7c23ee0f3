use medkg_error::FatalError;

#[derive(thiserror::Error, Debug, Clone)]
pub enum EmbedError {
    #[error("Tokenizer failure: {0}")]
    Tokenizer(String),

    #[error("Model download failed: {0}")]
    ModelDownload(String),

    #[error("I/O operation failed: {0}")]
    Io(String),

    #[error("Tensor operation failed: {0}")]
    Tensor(String),

    #[error("Invalid model configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: status {status}, body {body}")]
    Api { status: u16, body: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding rejected: {0}")]
    InvalidEmbedding(#[from] medkg_core::CoreError),

    #[error("Embedding task failed: {0}")]
    Task(String),
}

impl From<candle_core::Error> for EmbedError {
    fn from(e: candle_core::Error) -> Self {
        EmbedError::Tensor(e.to_string())
    }
}

impl From<tokenizers::Error> for EmbedError {
    fn from(e: tokenizers::Error) -> Self {
        EmbedError::Tokenizer(e.to_string())
    }
}

impl From<hf_hub::api::sync::ApiError> for EmbedError {
    fn from(e: hf_hub::api::sync::ApiError) -> Self {
        EmbedError::ModelDownload(e.to_string())
    }
}

impl From<std::io::Error> for EmbedError {
    fn from(e: std::io::Error) -> Self {
        EmbedError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EmbedError {
    fn from(e: serde_json::Error) -> Self {
        EmbedError::Config(e.to_string())
    }
}

/// Any embedder failure leaves the vector channel without input, so it is always fatal.
impl From<EmbedError> for medkg_error::Error {
    fn from(e: EmbedError) -> Self {
        FatalError::EmbeddingUnavailable(e.to_string()).into()
    }
}

/// Cut long provider bodies down before they reach logs.
pub(crate) fn truncate_string(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_errors_are_fatal() {
        let err: medkg_error::Error = EmbedError::Network("connection refused".into()).into();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_string("héllo", 2), "hé...");
        assert_eq!(truncate_string("short", 10), "short");
    }
}
