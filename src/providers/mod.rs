//! External service providers.
//!
//! - [`ai`] - Chat-completion LLM providers (OpenAI-compatible endpoints)

pub mod ai;
