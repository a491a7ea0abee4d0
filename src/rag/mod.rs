//! Retrieval-augmented answering over the persisted fact index.

pub mod answerer;
pub mod prompt;
pub mod retrieval;
pub mod sqlite;
pub mod store;
pub mod translator;

pub use answerer::{dedup_sources, Answerer, ChatAnswer};
pub use retrieval::{RetrievedChunk, Retriever, DEFAULT_TOP_K};
pub use sqlite::SqliteVectorStore;
pub use store::{NewFact, ScoredFact, StoredFact, VectorStore};
pub use translator::{translate, Language};
