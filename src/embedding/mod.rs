//! Vector embeddings and similarity search.
//!
//! # Architecture
//!
//! - [`EmbeddingProvider`] - Capability mapping strings to vectors
//! - [`SentenceEmbedder`] - Local transformer implementation of the provider
//! - [`UnavailableProvider`] - Stand-in when no backend could be loaded
//! - [`EmbeddingMatrix`] - Dense row-major matrix of embeddings
//! - [`best_match`] - Cosine arg-max over a matrix
//! - [`EmbeddingCache`] - Persists vocabulary matrices per model
//!
//! # Example
//!
//! ```ignore
//! use padanan::embedding::{best_match, EmbeddingConfig, EmbeddingProvider, SentenceEmbedder};
//!
//! let embedder = SentenceEmbedder::load(EmbeddingConfig::default())?;
//! let vocabulary = embedder.encode(&["makan".to_string(), "minum".to_string()])?;
//! let query = embedder.encode(&["santap".to_string()])?;
//! let best = best_match(query.row(0).unwrap(), &vocabulary)?;
//! ```

mod cache;
mod engine;
mod models;
mod provider;
mod similarity;

pub use cache::{CacheError, CacheResult, EmbeddingCache, DEFAULT_CACHE_DIR};
pub use engine::{EmbeddingConfig, SentenceEmbedder};
pub use models::ModelType;
pub use provider::{
    EmbeddingMatrix, EmbeddingProvider, ProviderError, ProviderResult, UnavailableProvider,
};
pub use similarity::{best_match, cosine_similarity, BestMatch, SimilarityError};

#[cfg(test)]
pub(crate) mod testing;
