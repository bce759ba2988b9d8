//! Fake embedding providers for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{EmbeddingMatrix, EmbeddingProvider, ProviderError, ProviderResult};

/// Gives every distinct string its own axis: identical strings get identical
/// vectors, different strings get orthogonal ones.
pub(crate) struct OneHotProvider {
    model_id: String,
    dimension: usize,
    axes: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
    failing: Vec<String>,
}

impl OneHotProvider {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            model_id: "test/one-hot".to_string(),
            dimension,
            axes: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            failing: Vec::new(),
        }
    }

    /// Pins `text` to a fixed axis so tests can build near matches.
    pub(crate) fn with_axis(self, text: &str, axis: usize) -> Self {
        self.axes.lock().unwrap().insert(text.to_string(), axis);
        self
    }

    /// Makes single-string requests for `text` fail. Batches still succeed,
    /// so an index can be built over a vocabulary containing `text`.
    pub(crate) fn failing_on(mut self, text: &str) -> Self {
        self.failing.push(text.to_string());
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for OneHotProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn encode(&self, texts: &[String]) -> ProviderResult<EmbeddingMatrix> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let [single] = texts {
            if self.failing.contains(single) {
                return Err(ProviderError::Unavailable(format!("cannot encode {}", single)));
            }
        }

        let mut axes = self.axes.lock().unwrap();
        let rows = texts
            .iter()
            .map(|text| {
                let next = axes.values().max().map_or(0, |m| m + 1);
                let axis = *axes.entry(text.clone()).or_insert(next);
                let mut row = vec![0.0; self.dimension];
                row[axis % self.dimension] = 1.0;
                row
            })
            .collect();
        EmbeddingMatrix::from_rows(rows)
    }
}
