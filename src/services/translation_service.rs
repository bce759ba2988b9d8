//! Retrieval-augmented translation.
//!
//! The [`TranslationService`] looks up example sentences for each query word,
//! formats them into a few-shot prompt and asks the LLM for a translation,
//! retrying failed or empty completions.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::BatchSettings;
use crate::domain::{LanguagePair, RetrievalResult};
use crate::providers::ai::{CompletionRequest, LlmError, LlmProvider};
use crate::retrieval::Retriever;
use crate::translation::translation_prompt;

/// Errors that can occur during translation.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The blocking retrieval task panicked or was cancelled.
    #[error("retrieval task failed: {0}")]
    Retrieval(String),

    /// Every attempt failed or returned an empty completion.
    #[error("translation failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

/// Result type for translation operations.
pub type TranslationResult<T> = Result<T, TranslationError>;

/// Bounded retries with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wait between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

impl From<&BatchSettings> for RetryPolicy {
    fn from(settings: &BatchSettings) -> Self {
        Self::new(settings.max_retries, settings.retry_delay())
    }
}

/// A completed translation and what went into it.
#[derive(Debug, Clone)]
pub struct Translation {
    /// Translated text as returned by the model, trimmed.
    pub text: String,
    /// Example sentences used in the prompt.
    pub matches: RetrievalResult,
    /// Prompt sent to the model.
    pub prompt: String,
    /// Attempts used, starting at 1.
    pub attempts: u32,
}

/// Translates queries with retrieved examples as context.
pub struct TranslationService {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    languages: LanguagePair,
    similarity_threshold: f32,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    retry: RetryPolicy,
}

impl TranslationService {
    /// Creates a service with the default language pair, a 0.4 similarity
    /// threshold and the default retry policy.
    pub fn new(retriever: Retriever, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            retriever,
            llm,
            languages: LanguagePair::default(),
            similarity_threshold: 0.4,
            temperature: None,
            max_tokens: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_languages(mut self, languages: LanguagePair) -> Self {
        self.languages = languages;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<usize>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Runs retrieval for `query` on the blocking pool.
    pub async fn retrieve(&self, query: &str) -> TranslationResult<RetrievalResult> {
        let retriever = self.retriever.clone();
        let query = query.to_string();
        let threshold = self.similarity_threshold;

        tokio::task::spawn_blocking(move || retriever.retrieve(&query, threshold))
            .await
            .map_err(|e| TranslationError::Retrieval(e.to_string()))
    }

    /// Translates `query`.
    pub async fn translate(&self, query: &str) -> TranslationResult<Translation> {
        let matches = self.retrieve(query).await?;
        let prompt = translation_prompt(query, &matches, &self.languages);

        tracing::debug!(
            matches = matches.len(),
            model = %self.llm.model(),
            "Requesting translation"
        );

        let request = CompletionRequest::from_prompt(prompt.as_str())
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let mut last_error = String::new();
        for attempt in 1..=self.retry.max_attempts {
            let mut wait = self.retry.delay;

            match self.llm.complete(&request).await {
                Ok(response) if !response.text.trim().is_empty() => {
                    return Ok(Translation {
                        text: response.text.trim().to_string(),
                        matches,
                        prompt,
                        attempts: attempt,
                    });
                }
                Ok(_) => {
                    tracing::warn!(attempt, max = self.retry.max_attempts, "Empty completion");
                    last_error = "empty completion".to_string();
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max = self.retry.max_attempts,
                        error = %e,
                        "Translation attempt failed"
                    );
                    if let LlmError::RateLimited {
                        retry_after_secs: Some(secs),
                    } = &e
                    {
                        wait = wait.max(Duration::from_secs(*secs));
                    }
                    last_error = e.to_string();
                }
            }

            if attempt < self.retry.max_attempts && !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }

        Err(TranslationError::Exhausted {
            attempts: self.retry.max_attempts,
            last_error,
        })
    }
}
