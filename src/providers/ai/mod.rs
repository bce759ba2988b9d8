//! LLM provider used to turn retrieval prompts into translations.
//!
//! # Example
//!
//! ```rust,no_run
//! use padanan::providers::ai::{CompletionRequest, LlmProvider, OpenAiCompatibleProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAiCompatibleProvider::openrouter("sk-or-...", "google/gemma-3-27b-it");
//! let response = provider
//!     .complete(&CompletionRequest::from_prompt("Translate \"saya\" into Minangkabau."))
//!     .await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

mod openai;
mod traits;

pub use openai::{OpenAiCompatibleProvider, OPENAI_BASE_URL, OPENROUTER_BASE_URL};
pub use traits::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, LlmResult,
    Message, Role, TokenUsage,
};
