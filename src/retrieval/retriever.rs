//! Per-word semantic lookup against a corpus index.

use std::collections::HashSet;
use std::sync::Arc;

use super::normalize::query_words;
use crate::corpus::{CorpusIndex, DataResult};
use crate::domain::{CorpusRow, RetrievalMatch, RetrievalResult};
use crate::embedding::{
    best_match, EmbeddingCache, EmbeddingProvider, ProviderResult, UnavailableProvider,
};

/// Finds, for each word of a query, the closest vocabulary word and an
/// example sentence pair containing it.
///
/// Holds shared read-only handles only, so clones are cheap and can run
/// concurrently as long as the provider is reentrant.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<CorpusIndex>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// Creates a retriever over `index` that embeds query words with `provider`.
    pub fn new(index: Arc<CorpusIndex>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, provider }
    }

    /// Builds the index over `rows` with a freshly loaded backend.
    ///
    /// When `loaded` is an error the failure is logged, the index keeps its
    /// vocabulary and word index without embeddings, and every lookup comes
    /// back empty. Only an empty corpus is an error.
    pub fn build<P>(
        rows: Vec<CorpusRow>,
        loaded: ProviderResult<P>,
        model_id: &str,
        cache: Option<&EmbeddingCache>,
    ) -> DataResult<Self>
    where
        P: EmbeddingProvider + 'static,
    {
        match loaded {
            Ok(provider) => {
                let index = CorpusIndex::build(rows, &provider, cache)?;
                Ok(Self::new(Arc::new(index), Arc::new(provider)))
            }
            Err(e) => {
                tracing::warn!(
                    model_id = %model_id,
                    error = %e,
                    "Embedding model unavailable, continuing without retrieval"
                );
                let index = CorpusIndex::build_without_embeddings(rows)?;
                let provider = UnavailableProvider::new(model_id, e.to_string());
                Ok(Self::new(Arc::new(index), Arc::new(provider)))
            }
        }
    }

    /// Returns the underlying index.
    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    /// Returns whether the index has embeddings to search.
    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// Looks up every distinct word of `query`.
    ///
    /// Words whose best similarity is below `similarity_threshold` are left
    /// out, as are words whose embedding could not be computed. An index
    /// without embeddings yields an empty result.
    pub fn retrieve(&self, query: &str, similarity_threshold: f32) -> RetrievalResult {
        let mut result = RetrievalResult::new();

        if !self.index.is_ready() {
            tracing::warn!("Corpus index has no embeddings, retrieval unavailable");
            return result;
        }

        let mut seen = HashSet::new();
        for word in query_words(query) {
            if !seen.insert(word.token.clone()) {
                continue;
            }

            let embedding = match self.provider.encode(std::slice::from_ref(&word.token)) {
                Ok(matrix) => matrix,
                Err(e) => {
                    tracing::warn!(word = %word.token, error = %e, "Failed to embed query word, skipping");
                    continue;
                }
            };
            let Some(vector) = embedding.row(0) else {
                tracing::warn!(word = %word.token, "Provider returned no embedding, skipping");
                continue;
            };

            let best = match best_match(vector, self.index.embeddings()) {
                Ok(best) => best,
                Err(e) => {
                    tracing::warn!(error = %e, "Similarity search failed");
                    continue;
                }
            };

            // Written so that a NaN score is rejected too.
            if !(best.score >= similarity_threshold) {
                tracing::debug!(
                    word = %word.token,
                    score = best.score,
                    threshold = similarity_threshold,
                    "No match above threshold"
                );
                continue;
            }

            let Some(matched_word) = self.index.vocabulary().get(best.index) else {
                continue;
            };
            let Some(example) = self.index.first_example(matched_word) else {
                continue;
            };

            tracing::debug!(
                word = %word.token,
                matched = %matched_word,
                score = best.score,
                "Matched query word"
            );

            result.push(RetrievalMatch {
                query_word: word.original.to_string(),
                token: word.token,
                matched_word: matched_word.to_string(),
                similarity: best.score,
                example: example.clone(),
            });
        }

        result
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("vocabulary", &self.index.vocabulary().len())
            .field("model_id", &self.provider.model_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::DataError;
    use crate::embedding::testing::OneHotProvider;
    use crate::embedding::ProviderError;
    use pretty_assertions::assert_eq;

    fn corpus() -> Vec<CorpusRow> {
        vec![
            CorpusRow::new("saya suka makan", "ambo suko makan"),
            CorpusRow::new("kami makan nasi", "kami makan nasi"),
        ]
    }

    fn retriever_with(provider: OneHotProvider) -> (Retriever, Arc<OneHotProvider>) {
        let provider = Arc::new(provider);
        let index = CorpusIndex::build(corpus(), provider.as_ref(), None).unwrap();
        let retriever = Retriever::new(Arc::new(index), provider.clone());
        (retriever, provider)
    }

    #[test]
    fn exact_words_match_themselves() {
        let (retriever, _) = retriever_with(OneHotProvider::new(16));
        let result = retriever.retrieve("saya suka makan", 0.99);

        assert_eq!(result.len(), 3);
        for m in &result {
            assert_eq!(m.token, m.matched_word);
            assert!((m.similarity - 1.0).abs() < 1e-6);
            assert_eq!(m.example, CorpusRow::new("saya suka makan", "ambo suko makan"));
        }
    }

    #[test]
    fn near_synonym_matches_through_shared_axis() {
        // "santap" shares an axis with "makan", so they embed identically.
        let provider = OneHotProvider::new(16)
            .with_axis("makan", 10)
            .with_axis("santap", 10);
        let (retriever, _) = retriever_with(provider);

        let result = retriever.retrieve("Santap!", 0.5);
        let m = result.get("Santap!").unwrap();

        assert_eq!(m.token, "santap");
        assert_eq!(m.matched_word, "makan");
        assert_eq!(m.example.source_text, "saya suka makan");
    }

    #[test]
    fn words_below_threshold_are_omitted() {
        let (retriever, _) = retriever_with(OneHotProvider::new(16));
        let result = retriever.retrieve("saya terbang", 0.5);

        let words: Vec<_> = result.query_words().collect();
        assert_eq!(words, vec!["saya"]);
    }

    #[test]
    fn threshold_above_cosine_range_returns_nothing() {
        let (retriever, _) = retriever_with(OneHotProvider::new(16));
        assert!(retriever.retrieve("saya suka makan", 1.1).is_empty());
    }

    #[test]
    fn repeated_words_produce_one_entry_and_one_lookup() {
        let (retriever, provider) = retriever_with(OneHotProvider::new(16));
        let before = provider.calls();

        let result = retriever.retrieve("makan makan MAKAN", 0.9);

        assert_eq!(result.len(), 1);
        assert_eq!(result.query_words().collect::<Vec<_>>(), vec!["makan"]);
        assert_eq!(provider.calls() - before, 1);
    }

    #[test]
    fn result_keeps_first_appearance_order() {
        let (retriever, _) = retriever_with(OneHotProvider::new(16));
        let result = retriever.retrieve("nasi, Kami suka", 0.9);

        let words: Vec<_> = result.query_words().collect();
        assert_eq!(words, vec!["nasi,", "Kami", "suka"]);
    }

    #[test]
    fn punctuation_only_query_makes_no_provider_calls() {
        let (retriever, provider) = retriever_with(OneHotProvider::new(16));
        let before = provider.calls();

        assert!(retriever.retrieve("!!! ?", 0.0).is_empty());
        assert_eq!(provider.calls(), before);
    }

    #[test]
    fn failing_word_does_not_discard_others() {
        let (retriever, _) = retriever_with(OneHotProvider::new(16).failing_on("suka"));
        let result = retriever.retrieve("saya suka makan", 0.9);

        let words: Vec<_> = result.query_words().collect();
        assert_eq!(words, vec!["saya", "makan"]);
    }

    #[test]
    fn index_without_embeddings_returns_empty_result() {
        let provider = UnavailableProvider::new("test/unavailable", "backend offline");
        let index = CorpusIndex::build(corpus(), &provider, None).unwrap();
        let retriever = Retriever::new(Arc::new(index), Arc::new(OneHotProvider::new(16)));

        assert!(!retriever.is_ready());
        assert!(retriever.retrieve("saya", 0.0).is_empty());
    }

    #[test]
    fn failed_load_keeps_vocabulary_without_retrieval() {
        let loaded: ProviderResult<OneHotProvider> = Err(ProviderError::Io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "config.json"),
        ));
        let retriever = Retriever::build(corpus(), loaded, "some/model", None).unwrap();

        assert!(!retriever.is_ready());
        assert!(retriever.index().embeddings().is_empty());
        assert!(!retriever.index().vocabulary().is_empty());
        assert!(retriever.index().first_example("saya").is_some());
        assert!(retriever.retrieve("saya suka makan", 0.0).is_empty());
    }

    #[test]
    fn failed_load_with_empty_corpus_is_still_an_error() {
        let loaded: ProviderResult<OneHotProvider> =
            Err(ProviderError::Unavailable("offline".to_string()));

        assert!(matches!(
            Retriever::build(Vec::new(), loaded, "some/model", None),
            Err(DataError::Empty)
        ));
    }

    #[test]
    fn loaded_provider_builds_ready_retriever() {
        let retriever =
            Retriever::build(corpus(), Ok(OneHotProvider::new(16)), "test/one-hot", None).unwrap();

        assert!(retriever.is_ready());
        assert_eq!(retriever.retrieve("saya", 0.9).len(), 1);
    }

    #[test]
    fn retrieve_is_idempotent() {
        let (retriever, _) = retriever_with(OneHotProvider::new(16));

        let first = retriever.retrieve("kami suka nasi goreng", 0.5);
        let second = retriever.retrieve("kami suka nasi goreng", 0.5);

        assert_eq!(first, second);
    }
}
