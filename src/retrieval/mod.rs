//! Query-side retrieval: normalization and per-word lookup.

mod normalize;
mod retriever;

pub use normalize::{normalize, query_words, tokenize, QueryWord};
pub use retriever::Retriever;
