//! Similarity-search strategy: embedding indexer, retriever and RAG strategy
//!
//! The pipeline is one-time indexing (corpus entries -> vectors -> vector
//! index) followed by per-question retrieval against the same index.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use serde::{Deserialize, Serialize};

mod handle;
mod indexer;
mod progress;
mod retriever;
mod strategy;

pub use handle::IndexHandle;
pub use indexer::EmbeddingIndexer;
pub use retriever::SimilarityRetriever;
pub use strategy::RagStrategy;

// Re-export error types from core
pub use codeeval_core::error::{Error, Result};
pub use codeeval_storage::ScoredPath;

/// A file that could not be indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexError {
    /// The file path where the error occurred
    pub file_path: String,
    /// The error message
    pub message: String,
}

impl IndexError {
    pub fn new(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            message: message.into(),
        }
    }
}

/// Statistics for an indexing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Corpus entries handed to the indexer
    pub total_files: usize,
    /// Files whose vectors are stored
    pub indexed_files: usize,
    /// Files skipped after embedding or upsert failures
    pub skipped_files: usize,
    /// Embedding batches sent
    pub batches: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
