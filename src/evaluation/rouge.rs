//! ROUGE F-measures over normalized tokens.

use serde::{Deserialize, Serialize};

use super::{clipped_overlap, ngram_counts};
use crate::retrieval::tokenize;

/// ROUGE-1, ROUGE-2 and ROUGE-L F-measures, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RougeScores {
    pub rouge_1: f64,
    pub rouge_2: f64,
    pub rouge_l: f64,
}

fn f_measure(overlap: usize, hypothesis_total: usize, reference_total: usize) -> f64 {
    if overlap == 0 || hypothesis_total == 0 || reference_total == 0 {
        return 0.0;
    }
    let precision = overlap as f64 / hypothesis_total as f64;
    let recall = overlap as f64 / reference_total as f64;
    2.0 * precision * recall / (precision + recall)
}

fn rouge_n(reference: &[String], hypothesis: &[String], n: usize) -> f64 {
    let overlap = clipped_overlap(&ngram_counts(hypothesis, n), &ngram_counts(reference, n));
    f_measure(
        overlap,
        hypothesis.len().saturating_sub(n - 1),
        reference.len().saturating_sub(n - 1),
    )
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for x in a {
        for (j, y) in b.iter().enumerate() {
            current[j + 1] = if x == y {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Scores `hypothesis` against `reference`.
pub fn rouge_scores(reference: &str, hypothesis: &str) -> RougeScores {
    let reference = tokenize(reference);
    let hypothesis = tokenize(hypothesis);

    RougeScores {
        rouge_1: rouge_n(&reference, &hypothesis, 1),
        rouge_2: rouge_n(&reference, &hypothesis, 2),
        rouge_l: f_measure(
            lcs_len(&reference, &hypothesis),
            hypothesis.len(),
            reference.len(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_is_one() {
        let scores = rouge_scores("Ambo suko makan.", "ambo suko makan");
        assert_eq!(
            scores,
            RougeScores {
                rouge_1: 1.0,
                rouge_2: 1.0,
                rouge_l: 1.0
            }
        );
    }

    #[test]
    fn reordered_words_keep_unigram_score() {
        let scores = rouge_scores("ambo suko makan", "makan suko ambo");

        assert_eq!(scores.rouge_1, 1.0);
        assert_eq!(scores.rouge_2, 0.0);
        assert!((scores.rouge_l - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn partial_match() {
        // 2 of 3 hypothesis words, 2 of 4 reference words.
        let scores = rouge_scores("ambo suko makan nasi", "ambo makan roti");
        let expected = 2.0 * (2.0 / 3.0) * 0.5 / (2.0 / 3.0 + 0.5);

        assert!((scores.rouge_1 - expected).abs() < 1e-12);
        assert!((scores.rouge_l - expected).abs() < 1e-12);
        assert_eq!(scores.rouge_2, 0.0);
    }

    #[test]
    fn empty_side_scores_zero() {
        assert_eq!(rouge_scores("", "ambo"), RougeScores::default());
        assert_eq!(rouge_scores("ambo", "!!!"), RougeScores::default());
    }

    #[test]
    fn lcs_length() {
        let a: Vec<String> = ["a", "b", "c", "d"].map(String::from).to_vec();
        let b: Vec<String> = ["b", "d", "c"].map(String::from).to_vec();
        assert_eq!(lcs_len(&a, &b), 2);
    }
}
