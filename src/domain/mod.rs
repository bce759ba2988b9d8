//! Domain types shared by the corpus index, the retriever and the services.

mod corpus;
mod retrieval;

pub use corpus::{CorpusRow, LanguagePair};
pub use retrieval::{RetrievalMatch, RetrievalResult};
