//! Retrieval output types.
//!
//! A [`RetrievalResult`] is produced per call to the retriever and never
//! persisted. It keeps matches in the order their query words first appeared.

use serde::{Deserialize, Serialize};

use super::CorpusRow;

/// The best vocabulary match found for one query word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalMatch {
    /// The query word exactly as it appeared in the query.
    pub query_word: String,
    /// The normalized token that was embedded and matched.
    pub token: String,
    /// The vocabulary word with the highest similarity.
    pub matched_word: String,
    /// Cosine similarity between the token and the matched word.
    pub similarity: f32,
    /// First corpus row containing the matched word.
    pub example: CorpusRow,
}

/// Ordered mapping from query word to its match.
///
/// Query words whose best similarity fell below the threshold are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    matches: Vec<RetrievalMatch>,
}

impl RetrievalResult {
    /// Creates an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a match unless one already exists for the same query word.
    ///
    /// Returns whether the match was added.
    pub fn push(&mut self, entry: RetrievalMatch) -> bool {
        if self.get(&entry.query_word).is_some() {
            return false;
        }
        self.matches.push(entry);
        true
    }

    /// Looks up the match for a query word.
    pub fn get(&self, query_word: &str) -> Option<&RetrievalMatch> {
        self.matches.iter().find(|m| m.query_word == query_word)
    }

    /// Returns the query words in order.
    pub fn query_words(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.query_word.as_str())
    }

    /// Iterates over matches in first-appearance order.
    pub fn iter(&self) -> std::slice::Iter<'_, RetrievalMatch> {
        self.matches.iter()
    }

    /// Returns the number of matches.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Returns whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a RetrievalMatch;
    type IntoIter = std::slice::Iter<'a, RetrievalMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

impl IntoIterator for RetrievalResult {
    type Item = RetrievalMatch;
    type IntoIter = std::vec::IntoIter<RetrievalMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}
