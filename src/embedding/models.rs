//! Known sentence-embedding models.
//!
//! All of these are BERT-architecture sentence-transformers checkpoints that
//! the local engine can run with mean pooling.

use serde::{Deserialize, Serialize};

/// Embedding models with known properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Multilingual paraphrase MiniLM, 50+ languages including Indonesian.
    #[default]
    ParaphraseMultilingualMiniLm,
    /// All-MiniLM-L6-v2, English only.
    AllMiniLmL6V2,
    /// Multilingual E5 small, needs an input prefix.
    MultilingualE5Small,
    /// BGE-Small, English retrieval model.
    BgeSmall,
}

impl ModelType {
    /// All known models.
    pub const ALL: [ModelType; 4] = [
        Self::ParaphraseMultilingualMiniLm,
        Self::AllMiniLmL6V2,
        Self::MultilingualE5Small,
        Self::BgeSmall,
    ];

    /// Returns the Hugging Face model ID.
    pub fn hf_model_id(&self) -> &'static str {
        match self {
            Self::ParaphraseMultilingualMiniLm => {
                "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2"
            }
            Self::AllMiniLmL6V2 => "sentence-transformers/all-MiniLM-L6-v2",
            Self::MultilingualE5Small => "intfloat/multilingual-e5-small",
            Self::BgeSmall => "BAAI/bge-small-en-v1.5",
        }
    }

    /// Looks up a model by its Hugging Face ID.
    pub fn from_hf_model_id(model_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.hf_model_id() == model_id)
    }

    /// Returns the expected embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        384
    }

    /// Returns whether the model was trained on more than one language.
    pub fn is_multilingual(&self) -> bool {
        matches!(
            self,
            Self::ParaphraseMultilingualMiniLm | Self::MultilingualE5Small
        )
    }

    /// Prefix the model expects in front of every input, if any.
    ///
    /// Word lookup is symmetric, so the query prefix is used on both sides.
    pub fn input_prefix(&self) -> Option<&'static str> {
        match self {
            Self::MultilingualE5Small => Some("query: "),
            _ => None,
        }
    }
}
