use reqwest::Client;
use serde::Serialize;

use crate::{
    config::HuggingFaceConfig,
    error::{truncate_string, EmbedError},
};

const API_BASE: &str = "https://api-inference.huggingface.co/models";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    inputs: &'a [String],
}

/// Remote feature-extraction endpoint on the Hugging Face inference API.
#[derive(Debug, Clone)]
pub struct HuggingFaceBackend {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    pub dimensions: usize,
}

impl HuggingFaceBackend {
    pub fn new(config: &HuggingFaceConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!("{API_BASE}/{}", config.model),
            dimensions: config.dimensions,
        }
    }

    /// Point the backend at a different URL, e.g. a self-hosted inference server.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[tracing::instrument(skip_all, fields(model = %self.model, inputs = snippets.len()))]
    pub async fn compute_batch(&self, snippets: Vec<String>) -> Result<Vec<Vec<f32>>, EmbedError> {
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest { inputs: &snippets })
            .send()
            .await
            .map_err(|e| EmbedError::Network(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status,
                body: truncate_string(&body, 512),
            });
        }

        res.json::<Vec<Vec<f32>>>()
            .await
            .map_err(|e| EmbedError::Network(e.to_string()))
    }
}
