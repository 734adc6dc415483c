#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Vector index collaborator: one vector per corpus file, keyed by path

pub mod error;
mod factory;
mod mock;

#[cfg(not(target_arch = "wasm32"))]
mod qdrant;

pub use error::StorageError;
pub use factory::create_vector_index;
pub use mock::InMemoryVectorIndex;

use async_trait::async_trait;
use codeeval_core::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Characters of file content stored alongside each vector
pub const PREVIEW_CHARS: usize = 200;

// ==== Traits ====

/// A single collection of file vectors
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn collection_name(&self) -> &str;

    /// Drop the collection if present and create it empty with cosine distance
    async fn recreate(&self, dimension: usize) -> Result<(), Error>;

    async fn exists(&self) -> Result<bool, Error>;

    /// Number of stored vectors
    async fn count(&self) -> Result<u64, Error>;

    /// Insert or overwrite vectors. Re-upserting a path replaces its vector.
    async fn upsert(&self, points: Vec<IndexedFile>) -> Result<(), Error>;

    /// The `limit` nearest files, by descending score
    async fn query(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredPath>, Error>;
}

// ==== Models ====

/// A corpus file ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFile {
    pub path: String,
    pub token_count: usize,
    pub preview: String,
    pub vector: Vec<f32>,
}

impl IndexedFile {
    pub fn new(
        path: impl Into<String>,
        content: &str,
        token_count: usize,
        vector: Vec<f32>,
    ) -> Self {
        Self {
            path: path.into(),
            token_count,
            preview: content.chars().take(PREVIEW_CHARS).collect(),
            vector,
        }
    }

    /// Stable point id for this file's path
    pub fn point_id(&self) -> Uuid {
        point_id(&self.path)
    }
}

/// A retrieved file with its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPath {
    pub path: String,
    pub score: f32,
    pub token_count: usize,
}

/// UUIDv5 of the repository-relative path
pub fn point_id(path: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, path.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_stable_per_path() {
        assert_eq!(point_id("src/a.ts"), point_id("src/a.ts"));
        assert_ne!(point_id("src/a.ts"), point_id("src/b.ts"));
        assert_eq!(point_id("src/a.ts").get_version_num(), 5);
    }

    #[test]
    fn test_indexed_file_preview_is_bounded() {
        let content = "é".repeat(PREVIEW_CHARS + 50);
        let file = IndexedFile::new("a.ts", &content, 10, vec![1.0]);
        assert_eq!(file.preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(file.point_id(), point_id("a.ts"));
    }
}
