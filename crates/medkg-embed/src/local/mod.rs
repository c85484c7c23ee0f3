//! In-process sentence embedding with candle.
//!
//! The model is a BERT encoder from the Hugging Face hub. A question is tokenized (truncated
//! to `max_length` tokens), run through the encoder, mean-pooled over the attention mask and
//! L2-normalised, which is what sentence-transformers does for `all-MiniLM-L6-v2`.

use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::{Tokenizer, TruncationParams};

use crate::{config::LocalModelConfig, error::EmbedError};

struct Inner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Cheap to clone; clones share the loaded weights.
#[derive(Clone)]
pub struct LocalEmbedder {
    inner: Arc<Inner>,
    model_id: String,
    dimensions: usize,
    max_length: usize,
}

impl std::fmt::Debug for LocalEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEmbedder")
            .field("model_id", &self.model_id)
            .field("dimensions", &self.dimensions)
            .field("max_length", &self.max_length)
            .finish()
    }
}

impl LocalEmbedder {
    /// Download (or reuse the cached copy of) the model and load it.
    ///
    /// Blocking: performs file and network I/O. Call it before entering the request loop, or
    /// from `spawn_blocking`.
    pub fn new(config: &LocalModelConfig) -> Result<Self, EmbedError> {
        let device = if config.use_gpu {
            Device::cuda_if_available(0).unwrap_or_else(|e| {
                tracing::warn!("CUDA not available ({e}), falling back to CPU");
                Device::Cpu
            })
        } else {
            Device::Cpu
        };

        let api = Api::new()?;
        let repo = match &config.revision {
            Some(rev) => Repo::with_revision(config.model_id.clone(), RepoType::Model, rev.clone()),
            None => Repo::new(config.model_id.clone(), RepoType::Model),
        };
        let repo = api.repo(repo);

        let config_path = repo.get("config.json")?;
        let raw_config = std::fs::read_to_string(config_path)?;
        let bert_config: Config = serde_json::from_str(&raw_config)?;
        let dimensions = serde_json::from_str::<serde_json::Value>(&raw_config)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| EmbedError::Config("config.json has no hidden_size".to_string()))?
            as usize;

        let tokenizer_path = repo.get("tokenizer.json")?;
        let mut tokenizer = Tokenizer::from_file(tokenizer_path)?;
        tokenizer.with_truncation(Some(TruncationParams {
            max_length: config.max_length,
            ..Default::default()
        }))?;
        tokenizer.with_padding(None);

        let weights_path = repo.get("model.safetensors")?;
        let vb = VarBuilder::from_buffered_safetensors(
            std::fs::read(weights_path)?,
            DType::F32,
            &device,
        )?;
        let model = BertModel::load(vb, &bert_config)
            .map_err(|e| EmbedError::Config(format!("Failed to load model: {}", e)))?;

        tracing::info!(
            model_id = %config.model_id,
            dimensions,
            device = ?device,
            "loaded local embedding model"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                model,
                tokenizer,
                device,
            }),
            model_id: config.model_id.clone(),
            dimensions,
            max_length: config.max_length,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text on the current thread.
    pub fn embed_blocking(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let Inner {
            model,
            tokenizer,
            device,
        } = self.inner.as_ref();

        let encoding = tokenizer.encode(text, true)?;
        let token_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = model.forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool(&hidden, &attention_mask)?;
        let normalized = l2_normalize(&pooled)?;
        Ok(normalized.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Embed on the blocking pool.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let this = self.clone();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || this.embed_blocking(&text))
            .await
            .map_err(|e| EmbedError::Task(e.to_string()))?
    }
}

/// Average of the token states `(batch, seq, hidden)` weighted by the attention mask
/// `(batch, seq)`. Fully masked rows come out as zeros instead of NaN.
pub fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask
        .to_dtype(hidden.dtype())?
        .unsqueeze(2)?
        .broadcast_as(hidden.shape())?;
    let summed = (hidden * &mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    summed / counts
}

/// Scale each row of `(batch, hidden)` to unit length. Zero rows stay zero.
pub fn l2_normalize(v: &Tensor) -> candle_core::Result<Tensor> {
    let norms = v.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12f32, f32::MAX)?;
    v.broadcast_div(&norms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn mean_pool_ignores_padding() -> candle_core::Result<()> {
        // one sequence, three tokens, hidden size two; the last token is padding
        let hidden = Tensor::new(&[[[1f32, 2.], [3., 4.], [100., 100.]]], &Device::Cpu)?;
        let mask = Tensor::new(&[[1u32, 1, 0]], &Device::Cpu)?;
        let pooled = mean_pool(&hidden, &mask)?;
        assert_eq!(pooled.dims(), &[1, 2]);
        assert!(close(&pooled.squeeze(0)?.to_vec1::<f32>()?, &[2., 3.]));
        Ok(())
    }

    #[test]
    fn mean_pool_all_masked_is_zero() -> candle_core::Result<()> {
        let hidden = Tensor::new(&[[[5f32, 5.]]], &Device::Cpu)?;
        let mask = Tensor::new(&[[0u32]], &Device::Cpu)?;
        let pooled = mean_pool(&hidden, &mask)?;
        assert!(close(&pooled.squeeze(0)?.to_vec1::<f32>()?, &[0., 0.]));
        Ok(())
    }

    #[test]
    fn l2_normalize_gives_unit_rows() -> candle_core::Result<()> {
        let v = Tensor::new(&[[3f32, 4.], [0., 0.]], &Device::Cpu)?;
        let rows = l2_normalize(&v)?.to_vec2::<f32>()?;
        assert!(close(&rows[0], &[0.6, 0.8]));
        assert!(close(&rows[1], &[0., 0.]));
        Ok(())
    }
}
