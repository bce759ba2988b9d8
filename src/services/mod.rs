//! Business services layer.
//!
//! Services orchestrate the retrieval engine and the LLM provider:
//!
//! ```text
//! Binary (settings, startup)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Retrieval, Evaluation, Providers
//! ```
//!
//! # Services Overview
//!
//! - [`TranslationService`]: Retrieval-augmented translation with retries
//! - [`BatchEvaluator`]: Translates and scores a test set, persisting progress

mod batch_service;
mod translation_service;

#[cfg(test)]
pub(crate) mod testing;

pub use batch_service::{
    rescore_results, BatchError, BatchEvaluator, BatchResult, BatchSummary, ResultRecord,
    ERROR_TRANSLATION, RESULT_FILE, SUMMARY_FILE,
};
pub use translation_service::{
    RetryPolicy, Translation, TranslationError, TranslationResult, TranslationService,
};
