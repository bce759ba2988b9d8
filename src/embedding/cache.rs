//! File-backed cache of vocabulary embedding matrices.
//!
//! One file per model under the cache directory, named after the model id.
//! Files are replaced atomically so a concurrent reader never observes a
//! partially written matrix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::EmbeddingMatrix;
use crate::storage::write_atomic;

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "model";

/// Errors that can occur while reading or writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cache encoding error: {0}")]
    Encoding(#[from] bincode::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Deserialize)]
struct CachedMatrix {
    model_id: String,
    matrix: EmbeddingMatrix,
}

#[derive(Serialize)]
struct CachedMatrixRef<'a> {
    model_id: &'a str,
    matrix: &'a EmbeddingMatrix,
}

/// Key-to-matrix store addressed by embedding model id.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    dir: PathBuf,
}

impl EmbeddingCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file used for `model_id`.
    pub fn path_for(&self, model_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}_embeddings.bin", sanitize_model_id(model_id)))
    }

    /// Loads the matrix stored for `model_id`.
    ///
    /// A missing file, or a file written for a different model id, yields
    /// `Ok(None)`.
    pub fn load(&self, model_id: &str) -> CacheResult<Option<EmbeddingMatrix>> {
        let path = self.path_for(model_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No cached embeddings");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let cached: CachedMatrix = bincode::deserialize(&bytes)?;
        if cached.model_id != model_id {
            tracing::debug!(
                path = %path.display(),
                stored = %cached.model_id,
                requested = %model_id,
                "Cached embeddings belong to another model"
            );
            return Ok(None);
        }

        tracing::debug!(
            path = %path.display(),
            rows = cached.matrix.rows(),
            "Loaded cached embeddings"
        );
        Ok(Some(cached.matrix))
    }

    /// Stores `matrix` for `model_id`, replacing any previous entry.
    pub fn store(&self, model_id: &str, matrix: &EmbeddingMatrix) -> CacheResult<()> {
        let path = self.path_for(model_id);
        let bytes = bincode::serialize(&CachedMatrixRef { model_id, matrix })?;
        write_atomic(&path, &bytes)?;

        tracing::info!(
            path = %path.display(),
            rows = matrix.rows(),
            "Saved embeddings to cache"
        );
        Ok(())
    }

    /// Deletes the entry for `model_id`. Returns whether a file was removed.
    pub fn invalidate(&self, model_id: &str) -> CacheResult<bool> {
        match fs::remove_file(self.path_for(model_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}

/// Maps a model id to a safe file name stem.
fn sanitize_model_id(model_id: &str) -> String {
    model_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
