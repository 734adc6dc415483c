//! In-memory vector index with exact cosine search

use crate::error::StorageError;
use crate::{IndexedFile, ScoredPath, VectorIndex};
use async_trait::async_trait;
use codeeval_core::Error;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

struct Collection {
    dimension: usize,
    points: BTreeMap<String, IndexedFile>,
}

/// Process-local index used by tests and `storage.provider = "mock"`
pub struct InMemoryVectorIndex {
    collection_name: String,
    collection: RwLock<Option<Collection>>,
    rejected_paths: HashSet<String>,
}

impl InMemoryVectorIndex {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            collection: RwLock::new(None),
            rejected_paths: HashSet::new(),
        }
    }

    /// Fail any upsert that includes `path`
    pub fn rejecting(mut self, path: impl Into<String>) -> Self {
        self.rejected_paths.insert(path.into());
        self
    }

    /// Stored paths, sorted
    pub async fn paths(&self) -> Vec<String> {
        self.collection
            .read()
            .await
            .as_ref()
            .map(|c| c.points.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn missing(&self) -> Error {
        StorageError::CollectionNotFound(self.collection_name.clone()).into()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn recreate(&self, dimension: usize) -> Result<(), Error> {
        *self.collection.write().await = Some(Collection {
            dimension,
            points: BTreeMap::new(),
        });
        Ok(())
    }

    async fn exists(&self) -> Result<bool, Error> {
        Ok(self.collection.read().await.is_some())
    }

    async fn count(&self) -> Result<u64, Error> {
        let guard = self.collection.read().await;
        let collection = guard.as_ref().ok_or_else(|| self.missing())?;
        Ok(collection.points.len() as u64)
    }

    async fn upsert(&self, points: Vec<IndexedFile>) -> Result<(), Error> {
        if let Some(rejected) = points.iter().find(|p| self.rejected_paths.contains(&p.path)) {
            return Err(StorageError::BackendError(format!(
                "upsert rejected for {}",
                rejected.path
            ))
            .into());
        }

        let mut guard = self.collection.write().await;
        let collection = guard.as_mut().ok_or_else(|| self.missing())?;

        for point in &points {
            if point.vector.len() != collection.dimension {
                return Err(StorageError::InvalidDimensions {
                    expected: collection.dimension,
                    actual: point.vector.len(),
                }
                .into());
            }
        }
        for point in points {
            collection.points.insert(point.path.clone(), point);
        }
        Ok(())
    }

    async fn query(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredPath>, Error> {
        let guard = self.collection.read().await;
        let collection = guard.as_ref().ok_or_else(|| self.missing())?;

        if vector.len() != collection.dimension {
            return Err(StorageError::InvalidDimensions {
                expected: collection.dimension,
                actual: vector.len(),
            }
            .into());
        }

        let mut scored: Vec<ScoredPath> = collection
            .points
            .values()
            .map(|point| ScoredPath {
                path: point.path.clone(),
                score: cosine(&vector, &point.vector),
                token_count: point.token_count,
            })
            .collect();

        // Ties resolve by path so results are reproducible
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, vector: Vec<f32>) -> IndexedFile {
        IndexedFile::new(path, "content", 7, vector)
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let index = InMemoryVectorIndex::new("test");
        assert!(!index.exists().await.expect("exists"));
        assert!(index.count().await.is_err());
        assert!(index.query(vec![1.0, 0.0], 3).await.is_err());
    }

    #[tokio::test]
    async fn test_query_orders_by_cosine() {
        let index = InMemoryVectorIndex::new("test");
        index.recreate(2).await.expect("recreate");
        index
            .upsert(vec![
                file("far.ts", vec![0.0, 1.0]),
                file("near.ts", vec![1.0, 0.1]),
                file("exact.ts", vec![2.0, 0.0]),
            ])
            .await
            .expect("upsert");

        let results = index.query(vec![1.0, 0.0], 2).await.expect("query");
        let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["exact.ts", "near.ts"]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].token_count, 7);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_path() {
        let index = InMemoryVectorIndex::new("test");
        index.recreate(2).await.expect("recreate");
        index.upsert(vec![file("a.ts", vec![1.0, 0.0])]).await.expect("upsert");
        index.upsert(vec![file("a.ts", vec![0.0, 1.0])]).await.expect("upsert");

        assert_eq!(index.count().await.expect("count"), 1);
        let results = index.query(vec![0.0, 1.0], 1).await.expect("query");
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_recreate_clears_points() {
        let index = InMemoryVectorIndex::new("test");
        index.recreate(2).await.expect("recreate");
        index.upsert(vec![file("a.ts", vec![1.0, 0.0])]).await.expect("upsert");
        index.recreate(3).await.expect("recreate");
        assert_eq!(index.count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_and_rejection() {
        let index = InMemoryVectorIndex::new("test").rejecting("bad.ts");
        index.recreate(2).await.expect("recreate");

        assert!(index.upsert(vec![file("a.ts", vec![1.0])]).await.is_err());
        assert!(index
            .upsert(vec![file("ok.ts", vec![1.0, 0.0]), file("bad.ts", vec![1.0, 0.0])])
            .await
            .is_err());
        assert_eq!(index.count().await.expect("count"), 0);
    }
}
