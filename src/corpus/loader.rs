//! Reads a parallel corpus from a headered CSV file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DataError, DataResult};
use crate::domain::CorpusRow;

/// Names of the CSV columns holding each side of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusColumns {
    /// Column with source-language sentences.
    pub source: String,
    /// Column with target-language sentences.
    pub target: String,
}

impl Default for CorpusColumns {
    fn default() -> Self {
        Self {
            source: "indonesian".to_string(),
            target: "minangkabau".to_string(),
        }
    }
}

/// Loads every row of the CSV file at `path`.
pub fn load_corpus(path: &Path, columns: &CorpusColumns) -> DataResult<Vec<CorpusRow>> {
    tracing::info!(path = %path.display(), "Loading corpus");

    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_corpus(file, columns)?;

    tracing::info!(path = %path.display(), rows = rows.len(), "Corpus loaded");
    Ok(rows)
}

/// Reads corpus rows from CSV data with a header line.
///
/// Cells missing from short records are read as empty strings.
pub fn read_corpus<R: Read>(reader: R, columns: &CorpusColumns) -> DataResult<Vec<CorpusRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = reader.headers()?.clone();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    };
    let source_idx = position(&columns.source)?;
    let target_idx = position(&columns.target)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(CorpusRow::new(
            record.get(source_idx).unwrap_or_default(),
            record.get(target_idx).unwrap_or_default(),
        ));
    }
    Ok(rows)
}
