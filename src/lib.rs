//! padanan - Word-level semantic retrieval for example-based translation
//!
//! This crate indexes a parallel corpus by word, finds the closest corpus
//! word for each word of a query with sentence embeddings, and uses the
//! matching example sentences to prompt an LLM for a translation.

pub mod config;
pub mod corpus;
pub mod domain;
pub mod embedding;
pub mod evaluation;
pub mod providers;
pub mod retrieval;
pub mod services;
pub mod storage;
pub mod translation;
