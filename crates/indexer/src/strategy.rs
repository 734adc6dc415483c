//! Similarity search as a [`RetrievalStrategy`]

use crate::retriever::SimilarityRetriever;
use async_trait::async_trait;
use codeeval_core::error::Result;
use codeeval_core::{Question, RetrievalResult, RetrievalStrategy, Strategy};
use serde_json::json;
use std::collections::BTreeMap;

/// Fixed top-K similarity retrieval
///
/// Token usage is the sum of the retrieved files' token counts, i.e. what it
/// costs to put the retrieved context in front of a model.
pub struct RagStrategy {
    retriever: SimilarityRetriever,
    top_k: usize,
    model: String,
}

impl RagStrategy {
    pub fn new(retriever: SimilarityRetriever, top_k: usize, model: impl Into<String>) -> Self {
        Self {
            retriever,
            top_k,
            model: model.into(),
        }
    }
}

#[async_trait]
impl RetrievalStrategy for RagStrategy {
    fn strategy(&self) -> Strategy {
        Strategy::Rag
    }

    fn max_files(&self) -> usize {
        self.top_k
    }

    fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let handle = self.retriever.handle();
        let mut metadata = BTreeMap::new();
        metadata.insert("embedding_model".to_string(), json!(self.model));
        metadata.insert("top_k".to_string(), json!(self.top_k));
        metadata.insert("collection".to_string(), json!(handle.collection_name()));
        metadata.insert("indexed_files".to_string(), json!(handle.indexed_count()));
        metadata.insert("skipped_files".to_string(), json!(handle.skipped().len()));
        metadata
    }

    async fn retrieve(&self, question: &Question) -> Result<RetrievalResult> {
        let scored = self.retriever.retrieve(&question.text, self.top_k).await?;

        let token_usage = scored.iter().map(|s| s.token_count).sum();
        let (retrieved, scores) = scored.into_iter().map(|s| (s.path, s.score)).unzip();

        Ok(
            RetrievalResult::new(question.id.clone(), Strategy::Rag, retrieved, token_usage)
                .with_scores(scores),
        )
    }
}
