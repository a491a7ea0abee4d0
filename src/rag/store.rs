//! Abstract interface for the persisted fact index.
//!
//! The primary implementation is `SqliteVectorStore` in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// A fact record as it enters the index.
#[derive(Debug, Clone)]
pub struct NewFact {
    pub text: String,
    pub embedding: Vec<f32>,
    pub url: String,
}

/// A fact record as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFact {
    /// Unique identifier, monotonically assigned per collection.
    pub id: String,
    pub text: String,
    pub url: String,
}

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct ScoredFact {
    pub fact: StoredFact,
    /// Cosine similarity (higher = closer).
    pub score: f32,
}

/// Abstract interface for the persisted similarity index.
///
/// Append-only from the indexer's perspective; read-only for retrieval.
/// There is no update or delete path; a stale index is rebuilt from
/// scratch.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append records, assigning ids that continue from the current
    /// collection size. Returns the assigned ids in insertion order.
    async fn add(&self, records: Vec<NewFact>) -> Result<Vec<String>, ApiError>;

    /// Nearest neighbors of `query_embedding` under the collection's
    /// cosine metric, most similar first, at most `limit` results.
    async fn search(&self, query_embedding: &[f32], limit: usize)
        -> Result<Vec<ScoredFact>, ApiError>;

    /// Total record count in the collection.
    async fn count(&self) -> Result<usize, ApiError>;
}
