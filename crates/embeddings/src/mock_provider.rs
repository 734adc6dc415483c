//! Mock embedding provider for testing and dry runs

use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, EmbeddingTask};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use twox_hash::XxHash3_64;

/// Deterministic bag-of-words embeddings
///
/// Every lowercase alphanumeric word is hashed into one of `embedding_dim`
/// buckets and the resulting vector is L2-normalised, so texts that share
/// vocabulary end up close under cosine similarity.
pub struct MockEmbeddingProvider {
    embedding_dim: usize,
    fail_marker: Option<String>,
    transient_failures: AtomicUsize,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with specified embedding dimension
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            embedding_dim,
            fail_marker: None,
            transient_failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Reject any request containing a text that includes `marker`
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Fail the first `count` requests with a rate-limit error
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Number of `embed` calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Embedding for a single text, `None` when it contains no words
    pub fn embed_text(&self, text: &str) -> Option<Vec<f32>> {
        if self.embedding_dim == 0 {
            return None;
        }

        let mut vector = vec![0.0f32; self.embedding_dim];
        let mut words = 0usize;
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let bucket =
                (XxHash3_64::oneshot(word.as_bytes()) % self.embedding_dim as u64) as usize;
            vector[bucket] += 1.0;
            words += 1;
        }

        if words == 0 {
            return None;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        for value in &mut vector {
            *value /= norm;
        }
        Some(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(
        &self,
        texts: Vec<String>,
        _task: EmbeddingTask,
    ) -> Result<Vec<Option<Vec<f32>>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(EmbeddingError::RateLimited(
                "mock provider rate limit".to_string(),
            ));
        }

        if let Some(ref marker) = self.fail_marker {
            if texts.iter().any(|t| t.contains(marker.as_str())) {
                return Err(EmbeddingError::Rejected(format!(
                    "mock provider rejects inputs containing '{marker}'"
                )));
            }
        }

        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn embedding_dimension(&self) -> usize {
        self.embedding_dim
    }

    fn model_name(&self) -> &str {
        "mock-bag-of-words"
    }
}
