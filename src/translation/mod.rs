//! Turning retrieval results into translation instructions for an LLM.

mod prompt;

pub use prompt::{no_match_message, translation_prompt};
