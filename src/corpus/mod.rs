//! Parallel corpus loading and indexing.

mod index;
mod loader;

pub use index::{CorpusIndex, Vocabulary, WordIndex};
pub use loader::{load_corpus, read_corpus, CorpusColumns};

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort corpus loading or index construction.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Corpus is empty")]
    Empty,

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Failed to read corpus {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for corpus operations.
pub type DataResult<T> = Result<T, DataError>;
