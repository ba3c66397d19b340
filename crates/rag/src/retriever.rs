//! Query-time retrieval over the vector index.

use crate::embeddings::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::types::ScoredChunk;
use passage_core::AppResult;
use std::sync::Arc;

/// Retriever: embeds a query and delegates to the vector index.
///
/// `top_k` is fixed by configuration; `retrieve_with_k` exists for front
/// ends that expose an override. Embedding failures propagate to the
/// caller; no retry happens at this layer.
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever over a loaded index.
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    /// Retrieve the configured number of passages for a query.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        self.retrieve_with_k(query, self.top_k).await
    }

    /// Retrieve up to `k` passages for a query.
    pub async fn retrieve_with_k(&self, query: &str, k: usize) -> AppResult<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed(query).await?;
        let results = self.index.query(&query_embedding, k);

        tracing::debug!(
            "Retrieved {} passages for query (requested top-{})",
            results.len(),
            k
        );

        Ok(results)
    }
}
