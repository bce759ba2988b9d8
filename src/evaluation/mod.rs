//! Translation quality metrics.
//!
//! Sentence-level scores are used for per-row reporting; corpus scores are
//! computed from summed statistics rather than averaged sentence scores.
//!
//! - [`bleu`] - BLEU-4 with smoothing
//! - [`chrf`] - character n-gram F-score
//! - [`ter`] - translation edit rate with block shifts
//! - [`rouge`] - ROUGE-1, ROUGE-2 and ROUGE-L F-measures

pub mod bleu;
pub mod chrf;
pub mod rouge;
pub mod ter;

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

pub use bleu::{corpus_bleu, sentence_bleu, BleuStats};
pub use chrf::{corpus_chrf, sentence_chrf, ChrfStats};
pub use rouge::{rouge_scores, RougeScores};
pub use ter::{corpus_ter, sentence_ter, TerStats};

/// Counts every contiguous run of `n` items.
pub(crate) fn ngram_counts<T: Eq + Hash>(items: &[T], n: usize) -> HashMap<&[T], usize> {
    let mut counts = HashMap::new();
    if n == 0 || items.len() < n {
        return counts;
    }
    for window in items.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

/// Size of the multiset intersection of two n-gram count tables.
pub(crate) fn clipped_overlap<K: Eq + Hash>(
    hypothesis: &HashMap<K, usize>,
    reference: &HashMap<K, usize>,
) -> usize {
    hypothesis
        .iter()
        .map(|(gram, &count)| count.min(reference.get(gram).copied().unwrap_or(0)))
        .sum()
}

/// Scores of one hypothesis against its reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentenceScores {
    /// Smoothed sentence BLEU in [0, 1].
    pub bleu: f64,
    /// chrF in [0, 100].
    pub chrf: f64,
    /// Edit rate; `None` when the reference is empty.
    pub ter: Option<f64>,
    pub rouge: RougeScores,
}

/// Scores `hypothesis` against `reference` with every sentence metric.
pub fn score_sentence(reference: &str, hypothesis: &str) -> SentenceScores {
    SentenceScores {
        bleu: sentence_bleu(reference, hypothesis),
        chrf: sentence_chrf(reference, hypothesis),
        ter: sentence_ter(reference, hypothesis),
        rouge: rouge_scores(reference, hypothesis),
    }
}

/// Corpus-level scores over a set of hypothesis/reference pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusScores {
    /// Number of sentence pairs.
    pub sentences: usize,
    /// Corpus BLEU in [0, 100].
    pub bleu: f64,
    /// Corpus chrF in [0, 100].
    pub chrf: f64,
    /// Corpus TER in percent; `None` when every reference is empty.
    pub ter: Option<f64>,
    /// Mean of per-sentence BLEU in [0, 100].
    pub mean_sentence_bleu: f64,
}

/// Accumulates sufficient statistics for corpus scoring.
#[derive(Debug, Clone, Default)]
pub struct CorpusAccumulator {
    bleu: BleuStats,
    chrf: ChrfStats,
    ter: TerStats,
    sentence_bleu_sum: f64,
    sentences: usize,
}

impl CorpusAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one hypothesis/reference pair.
    pub fn add(&mut self, reference: &str, hypothesis: &str) {
        let bleu = BleuStats::from_pair(reference, hypothesis);
        self.sentence_bleu_sum += bleu.score(true);
        self.bleu += bleu;
        self.chrf += ChrfStats::from_pair(reference, hypothesis);
        self.ter += TerStats::from_pair(reference, hypothesis);
        self.sentences += 1;
    }

    pub fn len(&self) -> usize {
        self.sentences
    }

    pub fn is_empty(&self) -> bool {
        self.sentences == 0
    }

    /// Computes the corpus scores for everything added so far.
    pub fn finish(&self) -> CorpusScores {
        let mean_sentence_bleu = if self.sentences == 0 {
            0.0
        } else {
            self.sentence_bleu_sum / self.sentences as f64
        };

        CorpusScores {
            sentences: self.sentences,
            bleu: self.bleu.score(false),
            chrf: self.chrf.score(),
            ter: self.ter.score().map(|t| t * 100.0),
            mean_sentence_bleu,
        }
    }
}

impl<'a> Extend<(&'a str, &'a str)> for CorpusAccumulator {
    fn extend<I: IntoIterator<Item = (&'a str, &'a str)>>(&mut self, pairs: I) {
        for (reference, hypothesis) in pairs {
            self.add(reference, hypothesis);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ngram_counts_windows() {
        let tokens = ["a", "b", "a", "b"];
        let bigrams = ngram_counts(&tokens, 2);

        assert_eq!(bigrams.len(), 2);
        assert_eq!(bigrams[&tokens[0..2]], 2);
        assert_eq!(bigrams[&tokens[1..3]], 1);
        assert!(ngram_counts(&tokens, 5).is_empty());
        assert!(ngram_counts(&tokens, 0).is_empty());
    }

    #[test]
    fn clipped_overlap_takes_minimum_counts() {
        let hyp = ["the", "the", "the"];
        let reference = ["the", "cat"];
        let overlap = clipped_overlap(&ngram_counts(&hyp, 1), &ngram_counts(&reference, 1));
        assert_eq!(overlap, 1);
    }

    #[test]
    fn identical_sentence_scores_perfectly() {
        let scores = score_sentence("ambo suko makan nasi", "ambo suko makan nasi");

        assert!((scores.bleu - 1.0).abs() < 1e-9);
        assert!((scores.chrf - 100.0).abs() < 1e-9);
        assert_eq!(scores.ter, Some(0.0));
        assert_eq!(scores.rouge.rouge_l, 1.0);
    }

    #[test]
    fn empty_accumulator_finishes_with_zeros() {
        let scores = CorpusAccumulator::new().finish();

        assert_eq!(scores.sentences, 0);
        assert_eq!(scores.bleu, 0.0);
        assert_eq!(scores.chrf, 0.0);
        assert_eq!(scores.ter, None);
        assert_eq!(scores.mean_sentence_bleu, 0.0);
    }

    #[test]
    fn accumulator_on_identical_corpus() {
        let mut acc = CorpusAccumulator::new();
        acc.extend([
            ("ambo suko makan nasi", "ambo suko makan nasi"),
            ("kami pai ka pasa bisuak", "kami pai ka pasa bisuak"),
        ]);
        let scores = acc.finish();

        assert_eq!(acc.len(), 2);
        assert!((scores.bleu - 100.0).abs() < 1e-6);
        assert!((scores.chrf - 100.0).abs() < 1e-6);
        assert_eq!(scores.ter, Some(0.0));
        assert!((scores.mean_sentence_bleu - 100.0).abs() < 1e-6);
    }
}
