use serde::Deserialize;

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Settings for the in-process candle model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    pub model_id: String,
    /// Pin a hub revision so repeated runs embed with identical weights.
    pub revision: Option<String>,
    /// Tokens kept per input; longer questions are truncated.
    pub max_length: usize,
    /// Try CUDA device 0 before falling back to the CPU.
    pub use_gpu: bool,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            revision: None,
            max_length: 256,
            use_gpu: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL_ID.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}
