//! Application settings and configuration types.
//!
//! Settings are persisted to `~/.config/padanan/settings.json` (or the
//! platform equivalent) and loaded at startup. Every section falls back to
//! its defaults when absent from the file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::CorpusColumns;
use crate::domain::LanguagePair;
use crate::embedding::{EmbeddingConfig, DEFAULT_CACHE_DIR};
use crate::providers::ai::OPENROUTER_BASE_URL;
use crate::storage::write_atomic;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Top-level application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Parallel corpus used to build the index.
    pub corpus: CorpusSettings,
    /// Query-time retrieval options.
    pub retrieval: RetrievalSettings,
    /// Local embedding model.
    pub embedding: EmbeddingConfig,
    /// Chat-completion endpoint used for translation.
    pub llm: LlmSettings,
    /// Batch evaluation run.
    pub batch: BatchSettings,
}

impl Settings {
    /// Location of the settings file in the user's config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "padanan").map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Loads settings from `path`, using defaults when the file is missing.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let settings: Self = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes settings to `path` as pretty-printed JSON, replacing the file
    /// atomically.
    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_atomic(path, &json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks value ranges serde cannot express.
    pub fn validate(&self) -> SettingsResult<()> {
        let threshold = self.retrieval.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SettingsError::Invalid {
                field: "retrieval.similarity_threshold",
                reason: format!("{} is outside [0, 1]", threshold),
            });
        }
        if self.batch.max_retries == 0 {
            return Err(SettingsError::Invalid {
                field: "batch.max_retries",
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.embedding.batch_size == 0 {
            return Err(SettingsError::Invalid {
                field: "embedding.batch_size",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Where the parallel corpus lives and which columns hold each language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Headered CSV file.
    pub path: PathBuf,
    /// Column holding source-language sentences.
    pub source_column: String,
    /// Column holding target-language sentences.
    pub target_column: String,
    /// Language names used in translation prompts.
    pub languages: LanguagePair,
}

impl CorpusSettings {
    /// Column names in the form the corpus loader takes.
    pub fn columns(&self) -> CorpusColumns {
        CorpusColumns {
            source: self.source_column.clone(),
            target: self.target_column.clone(),
        }
    }
}

impl Default for CorpusSettings {
    fn default() -> Self {
        let columns = CorpusColumns::default();
        Self {
            path: PathBuf::from("dataset/train.csv"),
            source_column: columns.source,
            target_column: columns.target,
            languages: LanguagePair::default(),
        }
    }
}

/// Query-time retrieval options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Minimum cosine similarity for a word match.
    pub similarity_threshold: f32,
    /// Directory holding cached vocabulary embeddings.
    pub cache_dir: PathBuf,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.4,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

/// Chat-completion endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature; the endpoint default applies when unset.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response.
    pub max_tokens: Option<usize>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            model: "google/gemma-3-27b-it".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

/// Batch evaluation run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Test CSV with the same columns as the corpus.
    pub test_path: PathBuf,
    /// Directory receiving `result.csv` and `total_evaluation.txt`.
    pub output_dir: PathBuf,
    /// Translation attempts per row.
    pub max_retries: u32,
    /// Wait between attempts for the same row.
    pub retry_delay_secs: u64,
    /// Wait between rows.
    pub request_delay_secs: u64,
}

impl BatchSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            test_path: PathBuf::from("dataset/test.csv"),
            output_dir: PathBuf::from("results"),
            max_retries: 3,
            retry_delay_secs: 5,
            request_delay_secs: 1,
        }
    }
}
