//! Embedding provider capability and the dense matrix it produces.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by an embedding backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Embedding backend unavailable: {0}")]
    Unavailable(String),

    #[error("Model error: {0}")]
    Model(#[from] candle_core::Error),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Model hub error: {0}")]
    Hub(String),

    #[error("Invalid model config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid provider output: {0}")]
    InvalidOutput(String),
}

/// Result type for embedding operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Maps strings to fixed-length vectors.
///
/// Implementations must return one row per input, in input order. The
/// retriever may call `encode` from several threads at once; a backend that
/// is not reentrant has to serialize internally.
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the underlying model, used as the embedding cache key.
    fn model_id(&self) -> &str;

    /// Encodes a batch of strings.
    fn encode(&self, texts: &[String]) -> ProviderResult<EmbeddingMatrix>;

    /// Width of the vectors this provider produces, when known up front.
    fn dimension(&self) -> Option<usize> {
        None
    }
}

/// Stand-in for a backend that could not be loaded.
///
/// Every call fails with [`ProviderError::Unavailable`], so retrieval over it
/// finds nothing.
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    model_id: String,
    reason: String,
}

impl UnavailableProvider {
    pub fn new(model_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            reason: reason.into(),
        }
    }
}

impl EmbeddingProvider for UnavailableProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn encode(&self, _texts: &[String]) -> ProviderResult<EmbeddingMatrix> {
        Err(ProviderError::Unavailable(self.reason.clone()))
    }
}

/// Dense row-major matrix of `f32` embeddings.
///
/// Every row has the same width. An empty matrix has zero rows and zero
/// columns. Deserialization checks the shape, so a decoded matrix upholds
/// the same invariants as one built with [`EmbeddingMatrix::from_rows`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct EmbeddingMatrix {
    rows: usize,
    dimension: usize,
    values: Vec<f32>,
}

/// Wire form of [`EmbeddingMatrix`] before its shape is checked.
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    dimension: usize,
    values: Vec<f32>,
}

impl TryFrom<RawMatrix> for EmbeddingMatrix {
    type Error = ProviderError;

    fn try_from(raw: RawMatrix) -> ProviderResult<Self> {
        if raw.rows == 0 {
            if !raw.values.is_empty() {
                return Err(ProviderError::InvalidOutput(format!(
                    "matrix without rows holds {} values",
                    raw.values.len()
                )));
            }
            return Ok(Self::empty());
        }
        if raw.dimension == 0 {
            return Err(ProviderError::InvalidOutput(
                "embedding rows have zero width".to_string(),
            ));
        }
        let expected = raw.rows.checked_mul(raw.dimension);
        if expected != Some(raw.values.len()) {
            return Err(ProviderError::InvalidOutput(format!(
                "{} values cannot fill {} rows of width {}",
                raw.values.len(),
                raw.rows,
                raw.dimension
            )));
        }
        Ok(Self {
            rows: raw.rows,
            dimension: raw.dimension,
            values: raw.values,
        })
    }
}

impl EmbeddingMatrix {
    /// Creates a matrix with no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a matrix from per-row vectors.
    ///
    /// Fails if the rows differ in length or have zero width.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> ProviderResult<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::empty());
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(ProviderError::InvalidOutput(
                "embedding rows have zero width".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(rows.len() * dimension);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dimension {
                return Err(ProviderError::InvalidOutput(format!(
                    "row {} has width {}, expected {}",
                    i,
                    row.len(),
                    dimension
                )));
            }
            values.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            dimension,
            values,
        })
    }

    /// Appends all rows of `other` below the rows of `self`.
    pub fn append(&mut self, other: EmbeddingMatrix) -> ProviderResult<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.dimension != self.dimension {
            return Err(ProviderError::InvalidOutput(format!(
                "cannot append rows of width {} to a matrix of width {}",
                other.dimension, self.dimension
            )));
        }
        self.rows += other.rows;
        self.values.extend(other.values);
        Ok(())
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Width of every row.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns row `index`, if present.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.dimension;
        Some(&self.values[start..start + self.dimension])
    }

    /// Iterates over rows in order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.rows).filter_map(move |i| self.row(i))
    }
}
