//! Retriever stage: query embedding plus k-NN lookup.
//!
//! Retrieval failure must never crash a chat request, so every error path
//! degrades to an empty result set.

use std::sync::Arc;

use super::store::VectorStore;
use crate::llm::LlmProvider;

pub const DEFAULT_TOP_K: usize = 5;

/// A retrieved fact, ranked by similarity (closer = earlier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedChunk {
    pub text_chunk: String,
    pub source_url: String,
}

/// Embeds queries with the same model used for indexing and runs the
/// store's nearest-neighbor lookup. Mismatched embedding models silently
/// degrade ranking quality, so the model id is fixed at construction.
pub struct Retriever {
    provider: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStore>,
    embedding_model: String,
}

impl Retriever {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStore>,
        embedding_model: String,
    ) -> Self {
        Self {
            provider,
            store,
            embedding_model,
        }
    }

    /// Top-k most relevant chunks for `query`, most similar first.
    ///
    /// Empty on any failure; never propagates an error to the caller.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievedChunk> {
        tracing::info!("Starting retrieval for top {} chunks. Query: '{}'", top_k, query);

        let query_embedding = match self
            .provider
            .embed(&[query.to_string()], &self.embedding_model)
            .await
        {
            Ok(mut embeddings) if !embeddings.is_empty() => embeddings.swap_remove(0),
            Ok(_) => {
                tracing::error!("Embedding model returned no vector for the query");
                return Vec::new();
            }
            Err(e) => {
                tracing::error!("Failed to embed query: {}", e);
                return Vec::new();
            }
        };

        match self.store.search(&query_embedding, top_k).await {
            Ok(results) => {
                tracing::info!("Successfully retrieved {} results", results.len());
                results
                    .into_iter()
                    .map(|scored| RetrievedChunk {
                        text_chunk: scored.fact.text,
                        source_url: scored.fact.url,
                    })
                    .collect()
            }
            Err(e) => {
                tracing::error!("Failed during chunk retrieval: {}", e);
                Vec::new()
            }
        }
    }
}
