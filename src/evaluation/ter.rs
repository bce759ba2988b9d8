//! Translation edit rate with greedy block shifts.
//!
//! Shifts are applied one at a time, always the one that lowers the word
//! edit distance to the reference the most, until no shift helps. Each
//! shift costs one edit.

use std::ops::AddAssign;

/// Word-level Levenshtein distance.
fn edit_distance(hypothesis: &[&str], reference: &[&str]) -> usize {
    let mut previous: Vec<usize> = (0..=reference.len()).collect();
    let mut current = vec![0; reference.len() + 1];

    for (i, hyp_word) in hypothesis.iter().enumerate() {
        current[0] = i + 1;
        for (j, ref_word) in reference.iter().enumerate() {
            let substitution = previous[j] + usize::from(hyp_word != ref_word);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[reference.len()]
}

/// Starting positions and length of every maximal common run.
fn matching_runs(hypothesis: &[&str], reference: &[&str]) -> Vec<(usize, usize, usize)> {
    let mut runs = Vec::new();
    for (i, hyp_word) in hypothesis.iter().enumerate() {
        for (j, ref_word) in reference.iter().enumerate() {
            if hyp_word != ref_word {
                continue;
            }
            let len = hypothesis[i..]
                .iter()
                .zip(&reference[j..])
                .take_while(|(a, b)| a == b)
                .count();
            runs.push((i, j, len));
        }
    }
    runs
}

/// Applies the single most helpful shift, if any shift helps.
fn best_shift<'a>(
    hypothesis: &[&'a str],
    reference: &[&str],
    distance: usize,
) -> Option<(usize, Vec<&'a str>)> {
    let mut best: Option<(usize, Vec<&'a str>)> = None;

    for (start, target, len) in matching_runs(hypothesis, reference) {
        let block = &hypothesis[start..start + len];
        let rest: Vec<&'a str> = hypothesis[..start]
            .iter()
            .chain(&hypothesis[start + len..])
            .copied()
            .collect();
        let at = target.min(rest.len());
        let shifted: Vec<&'a str> = rest[..at]
            .iter()
            .chain(block)
            .chain(&rest[at..])
            .copied()
            .collect();

        let shifted_distance = edit_distance(&shifted, reference);
        if shifted_distance >= distance {
            continue;
        }
        let gain = distance - shifted_distance;
        if best.as_ref().map_or(true, |(g, _)| gain > *g) {
            best = Some((gain, shifted));
        }
    }

    best
}

/// Number of edits (shifts plus word edits) turning `hypothesis` into
/// `reference`.
pub fn edit_count(reference: &[&str], hypothesis: &[&str]) -> usize {
    let mut current: Vec<&str> = hypothesis.to_vec();
    let mut shifts = 0;

    loop {
        let distance = edit_distance(&current, reference);
        match best_shift(&current, reference, distance) {
            Some((_, shifted)) => {
                current = shifted;
                shifts += 1;
            }
            None => return shifts + distance,
        }
    }
}

/// Summed edits and reference lengths for corpus TER.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerStats {
    pub edits: usize,
    pub reference_len: usize,
}

impl TerStats {
    pub fn from_pair(reference: &str, hypothesis: &str) -> Self {
        let reference: Vec<&str> = reference.split_whitespace().collect();
        let hypothesis: Vec<&str> = hypothesis.split_whitespace().collect();

        Self {
            edits: edit_count(&reference, &hypothesis),
            reference_len: reference.len(),
        }
    }

    /// Edits per reference word; `None` for an empty reference.
    pub fn score(&self) -> Option<f64> {
        (self.reference_len > 0).then(|| self.edits as f64 / self.reference_len as f64)
    }
}

impl AddAssign for TerStats {
    fn add_assign(&mut self, other: Self) {
        self.edits += other.edits;
        self.reference_len += other.reference_len;
    }
}

/// Sentence TER; lower is better, and it can exceed 1.
pub fn sentence_ter(reference: &str, hypothesis: &str) -> Option<f64> {
    TerStats::from_pair(reference, hypothesis).score()
}

/// Corpus TER from summed edits over summed reference lengths.
pub fn corpus_ter<'a, I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut stats = TerStats::default();
    for (reference, hypothesis) in pairs {
        stats += TerStats::from_pair(reference, hypothesis);
    }
    stats.score()
}
