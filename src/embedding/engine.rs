//! Local sentence-embedding engine.
//!
//! Uses Candle to run a BERT-architecture sentence-transformers model on the
//! CPU (or GPU when available) and mean-pools token states into one vector
//! per input string.

use std::path::PathBuf;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use serde::{Deserialize, Serialize};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::models::ModelType;
use super::provider::{EmbeddingMatrix, EmbeddingProvider, ProviderError, ProviderResult};

/// Configuration for the embedding engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Model identifier for downloading from Hugging Face.
    pub model_id: String,
    /// Hub revision (branch, tag or commit).
    pub revision: String,
    /// Local directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors`. Skips the hub when set.
    pub model_path: Option<PathBuf>,
    /// Maximum sequence length for tokenization.
    pub max_seq_length: usize,
    /// Number of strings per forward pass.
    pub batch_size: usize,
    /// Whether to use GPU acceleration if available.
    pub use_gpu: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: ModelType::default().hf_model_id().to_string(),
            revision: "main".to_string(),
            model_path: None,
            max_seq_length: 128,
            batch_size: 32,
            use_gpu: false,
        }
    }
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

impl ModelFiles {
    fn resolve(config: &EmbeddingConfig) -> ProviderResult<Self> {
        if let Some(dir) = &config.model_path {
            return Ok(Self {
                config: dir.join("config.json"),
                tokenizer: dir.join("tokenizer.json"),
                weights: dir.join("model.safetensors"),
            });
        }

        let api = Api::new().map_err(|e| ProviderError::Hub(e.to_string()))?;
        let repo = api.repo(Repo::with_revision(
            config.model_id.clone(),
            RepoType::Model,
            config.revision.clone(),
        ));
        let fetch = |name: &str| {
            repo.get(name)
                .map_err(|e| ProviderError::Hub(format!("{}: {}", name, e)))
        };

        Ok(Self {
            config: fetch("config.json")?,
            tokenizer: fetch("tokenizer.json")?,
            weights: fetch("model.safetensors")?,
        })
    }
}

/// Embedding provider backed by a local transformer model.
pub struct SentenceEmbedder {
    config: EmbeddingConfig,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    known_model: Option<ModelType>,
}

impl SentenceEmbedder {
    /// Loads weights and tokenizer, downloading them if needed.
    pub fn load(config: EmbeddingConfig) -> ProviderResult<Self> {
        tracing::info!(
            model_id = %config.model_id,
            revision = %config.revision,
            "Loading sentence embedding model"
        );

        let device = if config.use_gpu {
            Device::cuda_if_available(0)?
        } else {
            Device::Cpu
        };

        let files = ModelFiles::resolve(&config)?;
        let bert_config: BertConfig =
            serde_json::from_str(&std::fs::read_to_string(&files.config)?)?;

        let mut tokenizer = Tokenizer::from_file(&files.tokenizer)
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;
        let padding = match tokenizer.get_padding() {
            Some(existing) => PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..existing.clone()
            },
            None => PaddingParams {
                strategy: PaddingStrategy::BatchLongest,
                ..Default::default()
            },
        };
        tokenizer.with_padding(Some(padding));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_seq_length,
                ..Default::default()
            }))
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;

        // SAFETY: the weights file is not modified while it is mapped.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DTYPE, &device)? };
        let model = BertModel::load(vb, &bert_config)?;

        let known_model = ModelType::from_hf_model_id(&config.model_id);
        if known_model.is_some_and(|m| !m.is_multilingual()) {
            tracing::warn!(
                model_id = %config.model_id,
                "Embedding model is English-only, Indonesian words may match poorly"
            );
        }

        tracing::info!(model_id = %config.model_id, "Embedding model ready");

        Ok(Self {
            config,
            model,
            tokenizer,
            device,
            known_model,
        })
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    fn encode_chunk(&self, texts: &[String]) -> ProviderResult<EmbeddingMatrix> {
        let inputs: Vec<String> = texts
            .iter()
            .map(|t| match self.known_model.and_then(|m| m.input_prefix()) {
                Some(prefix) => format!("{}{}", prefix, t),
                None => t.clone(),
            })
            .collect();

        let encodings = self
            .tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| ProviderError::Tokenizer(e.to_string()))?;

        let ids = encodings
            .iter()
            .map(|e| Tensor::new(e.get_ids(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;
        let masks = encodings
            .iter()
            .map(|e| Tensor::new(e.get_attention_mask(), &self.device))
            .collect::<candle_core::Result<Vec<_>>>()?;

        let input_ids = Tensor::stack(&ids, 0)?;
        let attention_mask = Tensor::stack(&masks, 0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pooling(&hidden, &attention_mask)?;

        let rows: Vec<Vec<f32>> = pooled.to_dtype(DType::F32)?.to_vec2()?;
        EmbeddingMatrix::from_rows(rows)
    }
}

impl EmbeddingProvider for SentenceEmbedder {
    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    fn dimension(&self) -> Option<usize> {
        self.known_model.map(|m| m.embedding_dim())
    }

    fn encode(&self, texts: &[String]) -> ProviderResult<EmbeddingMatrix> {
        let mut matrix = EmbeddingMatrix::empty();
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            matrix.append(self.encode_chunk(chunk)?)?;
        }

        if matrix.rows() != texts.len() {
            return Err(ProviderError::InvalidOutput(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                matrix.rows()
            )));
        }
        Ok(matrix)
    }
}

/// Averages token states over the positions the attention mask keeps.
fn mean_pooling(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = attention_mask.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = (mask.sum(1)? + 1e-9)?;
    summed.broadcast_div(&counts)
}
