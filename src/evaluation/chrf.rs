//! chrF: F-score over character n-grams.

use std::ops::AddAssign;

use super::{clipped_overlap, ngram_counts};

/// Highest character n-gram order.
pub const CHAR_ORDER: usize = 6;

/// Recall weight.
const BETA: f64 = 2.0;

const EPS: f64 = 1e-16;

/// Per-order hypothesis, reference and matching n-gram counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChrfStats {
    pub hypothesis: [usize; CHAR_ORDER],
    pub reference: [usize; CHAR_ORDER],
    pub matches: [usize; CHAR_ORDER],
}

impl ChrfStats {
    /// Collects statistics with whitespace removed from both sides.
    pub fn from_pair(reference: &str, hypothesis: &str) -> Self {
        let reference: Vec<char> = reference.chars().filter(|c| !c.is_whitespace()).collect();
        let hypothesis: Vec<char> = hypothesis.chars().filter(|c| !c.is_whitespace()).collect();

        let mut stats = Self::default();
        for n in 1..=CHAR_ORDER {
            let hyp_grams = ngram_counts(&hypothesis, n);
            let ref_grams = ngram_counts(&reference, n);
            stats.hypothesis[n - 1] = hypothesis.len().saturating_sub(n - 1);
            stats.reference[n - 1] = reference.len().saturating_sub(n - 1);
            stats.matches[n - 1] = clipped_overlap(&hyp_grams, &ref_grams);
        }
        stats
    }

    /// chrF in [0, 100].
    ///
    /// Precision and recall are averaged over the orders both sides have
    /// n-grams for, then combined with [`BETA`].
    pub fn score(&self) -> f64 {
        let mut effective_order = 0;
        let mut avg_precision = 0.0;
        let mut avg_recall = 0.0;

        for n in 0..CHAR_ORDER {
            let (hyp, reference, matches) = (self.hypothesis[n], self.reference[n], self.matches[n]);
            avg_precision += if hyp > 0 { matches as f64 / hyp as f64 } else { EPS };
            avg_recall += if reference > 0 { matches as f64 / reference as f64 } else { EPS };
            if hyp > 0 && reference > 0 {
                effective_order += 1;
            }
        }

        if effective_order == 0 {
            return 0.0;
        }
        avg_precision /= effective_order as f64;
        avg_recall /= effective_order as f64;

        let factor = BETA * BETA;
        let denominator = factor * avg_precision + avg_recall;
        if avg_precision + avg_recall == 0.0 || denominator == 0.0 {
            return 0.0;
        }
        100.0 * (1.0 + factor) * avg_precision * avg_recall / denominator
    }
}

impl AddAssign for ChrfStats {
    fn add_assign(&mut self, other: Self) {
        for n in 0..CHAR_ORDER {
            self.hypothesis[n] += other.hypothesis[n];
            self.reference[n] += other.reference[n];
            self.matches[n] += other.matches[n];
        }
    }
}

/// Sentence chrF in [0, 100].
pub fn sentence_chrf(reference: &str, hypothesis: &str) -> f64 {
    ChrfStats::from_pair(reference, hypothesis).score()
}

/// Corpus chrF in [0, 100] from summed statistics.
pub fn corpus_chrf<'a, I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut stats = ChrfStats::default();
    for (reference, hypothesis) in pairs {
        stats += ChrfStats::from_pair(reference, hypothesis);
    }
    stats.score()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_is_hundred() {
        assert!((sentence_chrf("ambo suko", "ambo suko") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn whitespace_is_ignored() {
        assert!((sentence_chrf("ambo suko", "ambosuko") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_characters_score_zero() {
        assert_eq!(sentence_chrf("abc", "xyz"), 0.0);
    }

    #[test]
    fn empty_hypothesis_scores_zero() {
        assert_eq!(sentence_chrf("ambo", ""), 0.0);
        assert_eq!(sentence_chrf("", ""), 0.0);
    }

    #[test]
    fn single_character_pair() {
        let stats = ChrfStats::from_pair("ab", "a");
        assert_eq!(stats.hypothesis, [1, 0, 0, 0, 0, 0]);
        assert_eq!(stats.reference, [2, 1, 0, 0, 0, 0]);
        assert_eq!(stats.matches, [1, 0, 0, 0, 0, 0]);

        // Only the unigram order is effective: precision 1, recall 1/2.
        let expected = 100.0 * 5.0 * 0.5 / (4.0 + 0.5);
        assert!((stats.score() - expected).abs() < 1e-6);
    }

    #[test]
    fn partial_overlap_is_between_bounds() {
        let score = sentence_chrf("ambo suko makan", "ambo suka makan");
        assert!(score > 50.0 && score < 100.0, "{score}");
    }

    #[test]
    fn corpus_chrf_sums_statistics() {
        let score = corpus_chrf([("ambo", "ambo"), ("suko", "suko")]);
        assert!((score - 100.0).abs() < 1e-9);
    }
}
