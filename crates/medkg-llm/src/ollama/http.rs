use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{Generator, LlmError};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Talks to a running ollama server over its `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaHttp {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaHttp {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl Generator for OllamaHttp {
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let resp = self
            .client
            .post(self.url())
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::Deserialization(e.to_string()))?;
        Ok(parsed.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn posts_non_streaming_request() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate").json_body(json!({
                    "model": "CustomLlama3:latest",
                    "prompt": "Tell me about Copper",
                    "stream": false
                }));
                then.status(200)
                    .json_body(json!({ "model": "CustomLlama3:latest", "response": " Copper is a metal. ", "done": true }));
            })
            .await;

        let llm = OllamaHttp::new(server.base_url(), "CustomLlama3:latest");
        let out = llm.generate("Tell me about Copper").await.unwrap();
        assert_eq!(out, "Copper is a metal.");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(404).body("model 'x' not found");
            })
            .await;

        let llm = OllamaHttp::new(server.base_url(), "x");
        match llm.generate("q").await.unwrap_err() {
            LlmError::Api { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_deserialization_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).body("not json");
            })
            .await;

        let llm = OllamaHttp::new(server.base_url(), "x");
        assert!(matches!(
            llm.generate("q").await,
            Err(LlmError::Deserialization(_))
        ));
    }
}
