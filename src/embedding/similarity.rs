//! Cosine similarity and arg-max search over an embedding matrix.

use thiserror::Error;

use super::EmbeddingMatrix;

/// Errors from similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimilarityError {
    /// The matrix to search has no rows.
    #[error("Cannot search an empty embedding matrix")]
    EmptyMatrix,
}

/// Index and score of the most similar matrix row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    /// Row index into the matrix.
    pub index: usize,
    /// Cosine similarity of that row with the query.
    pub score: f32,
}

/// Computes cosine similarity between two vectors.
///
/// Returns a value between -1.0 and 1.0. Vectors of different length, and
/// vectors where either norm is zero, have similarity 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Finds the row of `matrix` most similar to `query`.
///
/// When several rows share the maximum score the lowest index wins.
pub fn best_match(query: &[f32], matrix: &EmbeddingMatrix) -> Result<BestMatch, SimilarityError> {
    let mut best: Option<BestMatch> = None;

    for (index, row) in matrix.iter_rows().enumerate() {
        let score = cosine_similarity(query, row);
        match best {
            // Strict comparison keeps the earliest row on ties.
            Some(current) if score <= current.score || score.is_nan() => {}
            _ => best = Some(BestMatch { index, score }),
        }
    }

    best.ok_or(SimilarityError::EmptyMatrix)
}
