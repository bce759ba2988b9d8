//! Vocabulary, word-to-example map and vocabulary embeddings.
//!
//! A [`CorpusIndex`] is built eagerly in one call and never changes
//! afterwards. Adding rows means building a new index.

use std::collections::{BTreeSet, HashMap};

use super::{DataError, DataResult};
use crate::domain::CorpusRow;
use crate::embedding::{EmbeddingCache, EmbeddingMatrix, EmbeddingProvider};
use crate::retrieval::tokenize;

/// Sorted, deduplicated normalized words of the corpus source side.
///
/// The position of a word is its row in the vocabulary embedding matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns whether there are no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    /// Words in ascending order.
    pub fn as_slice(&self) -> &[String] {
        &self.words
    }

    /// Iterates over words in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

/// Maps each vocabulary word to the corpus rows containing it.
///
/// Rows are kept in corpus scan order, once per occurrence of the word.
#[derive(Debug, Clone, Default)]
pub struct WordIndex {
    buckets: HashMap<String, Vec<usize>>,
}

impl WordIndex {
    /// Row positions for `word`, in first-appearance order.
    pub fn rows_for(&self, word: &str) -> &[usize] {
        self.buckets.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns whether no word is indexed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Immutable retrieval index over a parallel corpus.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    rows: Vec<CorpusRow>,
    vocabulary: Vocabulary,
    word_index: WordIndex,
    embeddings: EmbeddingMatrix,
    model_id: Option<String>,
}

impl CorpusIndex {
    /// Builds the index and embeds its vocabulary with `provider`.
    ///
    /// A matrix stored in `cache` for the provider's model is reused when its
    /// row count matches the vocabulary; a freshly computed matrix is written
    /// back. Provider and cache failures are logged and leave the index
    /// without embeddings. Only an empty corpus is an error.
    pub fn build(
        rows: Vec<CorpusRow>,
        provider: &dyn EmbeddingProvider,
        cache: Option<&EmbeddingCache>,
    ) -> DataResult<Self> {
        let mut index = Self::build_without_embeddings(rows)?;
        index.embeddings = embed_vocabulary(&index.vocabulary, provider, cache);
        if !index.embeddings.is_empty() {
            index.model_id = Some(provider.model_id().to_string());
        }
        Ok(index)
    }

    /// Builds vocabulary and word index only.
    ///
    /// Useful when no embedding backend could be loaded; the resulting index
    /// is not ready for retrieval.
    pub fn build_without_embeddings(rows: Vec<CorpusRow>) -> DataResult<Self> {
        if rows.is_empty() {
            return Err(DataError::Empty);
        }

        let mut vocabulary = BTreeSet::new();
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();

        for (position, row) in rows.iter().enumerate() {
            for token in tokenize(&row.source_text) {
                buckets.entry(token.clone()).or_default().push(position);
                vocabulary.insert(token);
            }
        }

        let vocabulary = Vocabulary {
            words: vocabulary.into_iter().collect(),
        };
        tracing::info!(
            rows = rows.len(),
            vocabulary = vocabulary.len(),
            "Built corpus vocabulary"
        );

        Ok(Self {
            rows,
            vocabulary,
            word_index: WordIndex { buckets },
            embeddings: EmbeddingMatrix::empty(),
            model_id: None,
        })
    }

    /// All corpus rows in load order.
    pub fn rows(&self) -> &[CorpusRow] {
        &self.rows
    }

    /// The sorted vocabulary.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// The word-to-rows map.
    pub fn word_index(&self) -> &WordIndex {
        &self.word_index
    }

    /// Vocabulary embeddings; empty when no provider output is available.
    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    /// Model that produced the embeddings, if any.
    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    /// Returns whether retrieval can run against this index.
    pub fn is_ready(&self) -> bool {
        !self.vocabulary.is_empty() && self.embeddings.rows() == self.vocabulary.len()
    }

    /// Rows whose source side contains `word`, in corpus order.
    pub fn examples(&self, word: &str) -> impl Iterator<Item = &CorpusRow> {
        self.word_index
            .rows_for(word)
            .iter()
            .filter_map(move |&i| self.rows.get(i))
    }

    /// The first row whose source side contains `word`.
    pub fn first_example(&self, word: &str) -> Option<&CorpusRow> {
        self.examples(word).next()
    }
}

fn embed_vocabulary(
    vocabulary: &Vocabulary,
    provider: &dyn EmbeddingProvider,
    cache: Option<&EmbeddingCache>,
) -> EmbeddingMatrix {
    if vocabulary.is_empty() {
        tracing::warn!("Vocabulary is empty, skipping embeddings");
        return EmbeddingMatrix::empty();
    }

    let model_id = provider.model_id();

    if let Some(cache) = cache {
        let expected_dimension = provider.dimension();
        match cache.load(model_id) {
            Ok(Some(matrix))
                if matrix.rows() == vocabulary.len()
                    && expected_dimension.map_or(true, |d| d == matrix.dimension()) =>
            {
                tracing::info!(model_id = %model_id, rows = matrix.rows(), "Reusing cached embeddings");
                return matrix;
            }
            Ok(Some(matrix)) => {
                tracing::info!(
                    model_id = %model_id,
                    cached_rows = matrix.rows(),
                    cached_dimension = matrix.dimension(),
                    vocabulary = vocabulary.len(),
                    "Cached embeddings are stale, recomputing"
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(model_id = %model_id, error = %e, "Discarding unreadable embedding cache");
                if let Err(e) = cache.invalidate(model_id) {
                    tracing::warn!(model_id = %model_id, error = %e, "Failed to remove embedding cache");
                }
            }
        }
    }

    tracing::info!(model_id = %model_id, words = vocabulary.len(), "Embedding vocabulary");
    let matrix = match provider.encode(vocabulary.as_slice()) {
        Ok(matrix) if matrix.rows() == vocabulary.len() => matrix,
        Ok(matrix) => {
            tracing::warn!(
                model_id = %model_id,
                rows = matrix.rows(),
                vocabulary = vocabulary.len(),
                "Provider returned the wrong number of embeddings"
            );
            return EmbeddingMatrix::empty();
        }
        Err(e) => {
            tracing::warn!(model_id = %model_id, error = %e, "Embedding provider unavailable");
            return EmbeddingMatrix::empty();
        }
    };

    if let Some(cache) = cache {
        if let Err(e) = cache.store(model_id, &matrix) {
            tracing::warn!(model_id = %model_id, error = %e, "Failed to write embedding cache");
        }
    }

    matrix
}
