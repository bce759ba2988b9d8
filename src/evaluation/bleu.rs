//! BLEU over whitespace tokens.

use std::ops::AddAssign;

use super::{clipped_overlap, ngram_counts};

/// Highest n-gram order.
pub const MAX_ORDER: usize = 4;

/// Count added to zero n-gram matches in sentence BLEU.
const EPSILON: f64 = 0.1;

/// Sufficient statistics for BLEU; sums across sentences for corpus scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BleuStats {
    /// Clipped n-gram matches per order.
    pub matches: [usize; MAX_ORDER],
    /// Hypothesis n-gram counts per order.
    pub totals: [usize; MAX_ORDER],
    pub hypothesis_len: usize,
    pub reference_len: usize,
}

impl BleuStats {
    /// Collects statistics for one hypothesis against one reference.
    pub fn from_pair(reference: &str, hypothesis: &str) -> Self {
        let reference: Vec<&str> = reference.split_whitespace().collect();
        let hypothesis: Vec<&str> = hypothesis.split_whitespace().collect();

        let mut stats = Self {
            hypothesis_len: hypothesis.len(),
            reference_len: reference.len(),
            ..Default::default()
        };
        for n in 1..=MAX_ORDER {
            stats.matches[n - 1] =
                clipped_overlap(&ngram_counts(&hypothesis, n), &ngram_counts(&reference, n));
            stats.totals[n - 1] = hypothesis.len().saturating_sub(n - 1);
        }
        stats
    }

    /// BLEU in [0, 100] with exponential smoothing of zero-match orders.
    ///
    /// With `effective_order`, orders the hypothesis is too short to have are
    /// left out of the geometric mean instead of zeroing it.
    pub fn score(&self, effective_order: bool) -> f64 {
        if self.matches[0] == 0 {
            return 0.0;
        }

        let mut precisions = [0.0f64; MAX_ORDER];
        let mut order = MAX_ORDER;
        let mut smooth = 1.0;
        for n in 0..MAX_ORDER {
            if self.totals[n] == 0 {
                if effective_order {
                    order = n;
                }
                break;
            }
            precisions[n] = if self.matches[n] == 0 {
                smooth *= 2.0;
                100.0 / (smooth * self.totals[n] as f64)
            } else {
                100.0 * self.matches[n] as f64 / self.totals[n] as f64
            };
        }

        let used = &precisions[..order];
        if used.iter().any(|&p| p == 0.0) {
            return 0.0;
        }
        let log_mean = used.iter().map(|p| p.ln()).sum::<f64>() / order as f64;

        self.brevity_penalty() * log_mean.exp()
    }

    fn brevity_penalty(&self) -> f64 {
        if self.hypothesis_len >= self.reference_len {
            1.0
        } else if self.hypothesis_len == 0 {
            0.0
        } else {
            (1.0 - self.reference_len as f64 / self.hypothesis_len as f64).exp()
        }
    }
}

impl AddAssign for BleuStats {
    fn add_assign(&mut self, other: Self) {
        for n in 0..MAX_ORDER {
            self.matches[n] += other.matches[n];
            self.totals[n] += other.totals[n];
        }
        self.hypothesis_len += other.hypothesis_len;
        self.reference_len += other.reference_len;
    }
}

/// Smoothed sentence BLEU-4 in [0, 1].
///
/// Orders with no matches get [`EPSILON`] added to their match count; a
/// hypothesis sharing no unigram with the reference scores zero.
pub fn sentence_bleu(reference: &str, hypothesis: &str) -> f64 {
    let stats = BleuStats::from_pair(reference, hypothesis);
    if stats.matches[0] == 0 {
        return 0.0;
    }

    let weight = 1.0 / MAX_ORDER as f64;
    let log_sum: f64 = (0..MAX_ORDER)
        .map(|n| {
            let denominator = stats.totals[n].max(1) as f64;
            let numerator = match stats.matches[n] {
                0 => EPSILON,
                m => m as f64,
            };
            weight * (numerator / denominator).ln()
        })
        .sum();

    stats.brevity_penalty() * log_sum.exp()
}

/// Corpus BLEU in [0, 100] from summed sentence statistics.
pub fn corpus_bleu<'a, I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut stats = BleuStats::default();
    for (reference, hypothesis) in pairs {
        stats += BleuStats::from_pair(reference, hypothesis);
    }
    stats.score(false)
}
