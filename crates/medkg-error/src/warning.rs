/// Failures confined to one retrieval channel.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WarningError {
    #[error("Query translation failed: {0}")]
    TranslationFailure(String),

    #[error("Generated query rejected, contains mutating keyword `{keyword}`")]
    UnsafeQuery { keyword: String, query: String },

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("Answer generation failed for {channel} channel: {message}")]
    GenerationFailure { channel: String, message: String },
}
