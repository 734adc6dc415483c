//! Trait definition for embedding providers

use crate::error::Result;
use async_trait::async_trait;

/// What the embedded text will be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingTask {
    /// A question searched against the index
    Query,
    /// A document stored in the index
    #[default]
    Passage,
}

/// Trait for embedding providers
///
/// A single call maps to a single request against the provider. Batching,
/// concurrency and retry are layered on top by the caller.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a list of texts
    ///
    /// Returns one entry per input, in input order. `None` marks a text the
    /// provider could not embed (empty input).
    async fn embed(&self, texts: Vec<String>, task: EmbeddingTask)
        -> Result<Vec<Option<Vec<f32>>>>;

    /// The size of the embedding vectors produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Model identifier recorded with evaluation results
    fn model_name(&self) -> &str;
}
