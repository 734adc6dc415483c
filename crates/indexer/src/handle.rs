//! Handle to a populated vector index

use crate::{IndexError, IndexStats};
use codeeval_core::error::{Error, Result};
use codeeval_storage::VectorIndex;
use std::sync::Arc;
use tracing::info;

/// A collection that is ready to be queried
#[derive(Clone)]
pub struct IndexHandle {
    index: Arc<dyn VectorIndex>,
    indexed_count: u64,
    skipped: Vec<IndexError>,
    stats: Option<IndexStats>,
}

impl IndexHandle {
    pub(crate) fn new(
        index: Arc<dyn VectorIndex>,
        indexed_count: u64,
        skipped: Vec<IndexError>,
        stats: IndexStats,
    ) -> Self {
        Self {
            index,
            indexed_count,
            skipped,
            stats: Some(stats),
        }
    }

    /// Reuse a collection built by an earlier run
    ///
    /// Fails with a retrieval error when the collection is missing, empty or
    /// unreachable.
    pub async fn attach(index: Arc<dyn VectorIndex>) -> Result<Self> {
        let name = index.collection_name().to_string();

        let exists = index
            .exists()
            .await
            .map_err(|e| Error::retrieval(format!("Vector index unreachable: {e}")))?;
        if !exists {
            return Err(Error::retrieval(format!(
                "Collection '{name}' does not exist. Build it with --index-only first"
            )));
        }

        let count = index
            .count()
            .await
            .map_err(|e| Error::retrieval(format!("Vector index unreachable: {e}")))?;
        if count == 0 {
            return Err(Error::retrieval(format!("Collection '{name}' is empty")));
        }

        info!("Attached to collection '{name}' with {count} vectors");
        Ok(Self {
            index,
            indexed_count: count,
            skipped: Vec::new(),
            stats: None,
        })
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn collection_name(&self) -> &str {
        self.index.collection_name()
    }

    pub fn indexed_count(&self) -> u64 {
        self.indexed_count
    }

    pub fn is_empty(&self) -> bool {
        self.indexed_count == 0
    }

    /// Files that could not be indexed, empty for attached handles
    pub fn skipped(&self) -> &[IndexError] {
        &self.skipped
    }

    /// Statistics of the run that built this index, `None` when attached
    pub fn stats(&self) -> Option<&IndexStats> {
        self.stats.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeeval_storage::{IndexedFile, InMemoryVectorIndex};

    #[tokio::test]
    async fn test_attach_missing_collection() {
        let index = Arc::new(InMemoryVectorIndex::new("missing"));
        let err = IndexHandle::attach(index).await.err().expect("must fail");
        assert!(matches!(err, Error::Retrieval(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_attach_empty_collection() {
        let index = Arc::new(InMemoryVectorIndex::new("empty"));
        index.recreate(4).await.expect("recreate");
        let err = IndexHandle::attach(index).await.err().expect("must fail");
        assert!(err.to_string().contains("is empty"));
    }

    #[tokio::test]
    async fn test_attach_populated_collection() {
        let index = Arc::new(InMemoryVectorIndex::new("ready"));
        index.recreate(2).await.expect("recreate");
        index
            .upsert(vec![IndexedFile::new("a.ts", "x", 1, vec![1.0, 0.0])])
            .await
            .expect("upsert");

        let handle = IndexHandle::attach(index).await.expect("attach");
        assert_eq!(handle.indexed_count(), 1);
        assert_eq!(handle.collection_name(), "ready");
        assert!(handle.stats().is_none());
        assert!(handle.skipped().is_empty());
    }
}
