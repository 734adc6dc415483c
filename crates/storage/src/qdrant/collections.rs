use crate::error::StorageError;
use crate::{IndexedFile, ScoredPath, VectorIndex};
use async_trait::async_trait;
use codeeval_core::Error;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, DeleteCollectionBuilder, Distance,
    VectorParamsBuilder,
};
use tracing::info;

use super::QdrantIndex;

impl QdrantIndex {
    async fn collection_exists(&self) -> Result<bool, Error> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to list collections: {e}")))?;

        Ok(collections
            .collections
            .iter()
            .any(|c| c.name == self.collection_name))
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn collection_name(&self) -> &str {
        &self.collection_name
    }

    async fn recreate(&self, dimension: usize) -> Result<(), Error> {
        let name = &self.collection_name;

        if self.collection_exists().await? {
            info!("Deleting existing collection {name}");
            self.client
                .delete_collection(DeleteCollectionBuilder::new(name).build())
                .await
                .map_err(|e| {
                    StorageError::BackendError(format!("Failed to delete collection {name}: {e}"))
                })?;
        }

        info!("Creating collection {name} ({dimension} dims, cosine)");
        let create_collection = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine));

        self.client
            .create_collection(create_collection.build())
            .await
            .map_err(|e| {
                StorageError::BackendError(format!("Failed to create collection {name}: {e}"))
            })?;

        Ok(())
    }

    async fn exists(&self) -> Result<bool, Error> {
        self.collection_exists().await
    }

    async fn count(&self) -> Result<u64, Error> {
        if !self.collection_exists().await? {
            return Err(StorageError::CollectionNotFound(self.collection_name.clone()).into());
        }

        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection_name).exact(true))
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to count points: {e}")))?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn upsert(&self, points: Vec<IndexedFile>) -> Result<(), Error> {
        super::operations::upsert_files(self, points).await
    }

    async fn query(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<ScoredPath>, Error> {
        super::search::search_files(self, vector, limit).await
    }
}
