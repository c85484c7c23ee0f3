use async_trait::async_trait;
use medkg_core::QuestionEmbedding;
use tracing::instrument;

use crate::{
    error::EmbedError, local::LocalEmbedder, providers::hugging_face::HuggingFaceBackend,
    Embedder,
};

#[derive(Debug)]
pub struct EmbeddingProcessor {
    source: EmbeddingSource,
}

#[derive(Debug)]
pub enum EmbeddingSource {
    Local(LocalEmbedder),
    HuggingFace(HuggingFaceBackend),
}

impl EmbeddingProcessor {
    pub fn new(source: EmbeddingSource) -> Self {
        Self { source }
    }

    pub async fn generate_embeddings(
        &self,
        snippets: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        match &self.source {
            EmbeddingSource::Local(backend) => {
                let mut out = Vec::with_capacity(snippets.len());
                for s in &snippets {
                    out.push(backend.embed(s).await?);
                }
                Ok(out)
            }
            EmbeddingSource::HuggingFace(backend) => backend.compute_batch(snippets).await,
        }
    }

    pub fn dimensions(&self) -> usize {
        match &self.source {
            EmbeddingSource::Local(backend) => backend.dimensions(),
            EmbeddingSource::HuggingFace(backend) => backend.dimensions,
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingProcessor {
    #[instrument(skip_all, fields(question_len = text.len(), dims = self.dimensions()))]
    async fn embed(&self, text: &str) -> Result<QuestionEmbedding, EmbedError> {
        let vector = self
            .generate_embeddings(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(EmbedError::DimensionMismatch {
                expected: self.dimensions(),
                actual: 0,
            })?;
        if vector.len() != self.dimensions() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimensions(),
                actual: vector.len(),
            });
        }
        Ok(QuestionEmbedding::new(vector)?)
    }

    fn dimensions(&self) -> usize {
        EmbeddingProcessor::dimensions(self)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::config::HuggingFaceConfig;

    fn processor_for(server: &MockServer, dimensions: usize) -> EmbeddingProcessor {
        let backend = HuggingFaceBackend::new(&HuggingFaceConfig {
            api_key: "test-key".into(),
            model: "test/model".into(),
            dimensions,
        })
        .with_endpoint(server.url("/embed"));
        EmbeddingProcessor::new(EmbeddingSource::HuggingFace(backend))
    }

    #[tokio::test]
    async fn remote_embedding_is_returned() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/embed")
                    .json_body(json!({ "inputs": ["what treats acne?"] }));
                then.status(200).json_body(json!([[0.6, 0.8, 0.0]]));
            })
            .await;

        let processor = processor_for(&server, 3);
        let emb = processor.embed("what treats acne?").await.unwrap();
        assert_eq!(emb.as_slice(), &[0.6, 0.8, 0.0]);
        m.assert_async().await;
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(json!([[0.1, 0.2]]));
            })
            .await;

        let err = processor_for(&server, 3).embed("q").await.unwrap_err();
        assert!(matches!(
            err,
            EmbedError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn api_failure_keeps_status_and_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(503).body("model is loading");
            })
            .await;

        match processor_for(&server, 3).embed("q").await.unwrap_err() {
            EmbedError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model is loading");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
