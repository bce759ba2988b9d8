//! Parallel corpus domain types.

use serde::{Deserialize, Serialize};

/// One aligned sentence pair from the parallel corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorpusRow {
    /// Sentence in the source language (the side that is indexed).
    pub source_text: String,
    /// Translation of `source_text` in the target language.
    pub target_text: String,
}

impl CorpusRow {
    /// Creates a new sentence pair.
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
        }
    }
}

/// Names of the two languages of a parallel corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguagePair {
    /// Human-readable name of the source language.
    pub source: String,
    /// Human-readable name of the target language.
    pub target: String,
}

impl LanguagePair {
    /// Creates a language pair from two display names.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl Default for LanguagePair {
    fn default() -> Self {
        Self::new("Indonesian", "Minangkabau")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_row_constructor() {
        let row = CorpusRow::new("saya suka makan", "ambo suko makan");
        assert_eq!(row.source_text, "saya suka makan");
        assert_eq!(row.target_text, "ambo suko makan");
    }

    #[test]
    fn default_language_pair() {
        let pair = LanguagePair::default();
        assert_eq!(pair.source, "Indonesian");
        assert_eq!(pair.target, "Minangkabau");
    }

    #[test]
    fn corpus_row_serialization() {
        let row = CorpusRow::new("a", "b");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"source_text":"a","target_text":"b"}"#);
    }
}
