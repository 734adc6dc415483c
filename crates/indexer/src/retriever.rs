//! Similarity retriever: question -> nearest file vectors

use crate::handle::IndexHandle;
use codeeval_core::error::{Error, Result};
use codeeval_embeddings::EmbeddingManager;
use codeeval_storage::ScoredPath;
use std::sync::Arc;
use tracing::debug;

/// Embeds questions and queries the index built by the same provider
pub struct SimilarityRetriever {
    handle: IndexHandle,
    embeddings: Arc<EmbeddingManager>,
}

impl SimilarityRetriever {
    pub fn new(handle: IndexHandle, embeddings: Arc<EmbeddingManager>) -> Self {
        Self { handle, embeddings }
    }

    pub fn handle(&self) -> &IndexHandle {
        &self.handle
    }

    /// The `k` files most similar to `question`, by descending score
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<ScoredPath>> {
        if self.handle.is_empty() {
            return Err(Error::retrieval(format!(
                "Collection '{}' is empty",
                self.handle.collection_name()
            )));
        }

        let vector = self
            .embeddings
            .embed_query(question)
            .await
            .map_err(|e| Error::retrieval(format!("Failed to embed question: {e}")))?;

        let mut results = self
            .handle
            .index()
            .query(vector, k)
            .await
            .map_err(|e| Error::retrieval(format!("Vector search failed: {e}")))?;

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        debug!(
            "Retrieved {} files for question (top score {:?})",
            results.len(),
            results.first().map(|r| r.score)
        );
        Ok(results)
    }
}
