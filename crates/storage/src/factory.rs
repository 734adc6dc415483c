use crate::error::StorageError;
use crate::{mock::InMemoryVectorIndex, VectorIndex};
use codeeval_core::{config::StorageConfig, Error};
use std::sync::Arc;

use crate::qdrant::QdrantIndexBuilder;

/// Creates a vector index bound to `collection_name`
///
/// Returns a trait object so the Qdrant backend and the in-memory index are
/// interchangeable.
///
/// # Errors
/// Returns an error if the provider is unknown or Qdrant is unreachable
pub async fn create_vector_index(
    config: &StorageConfig,
    collection_name: impl Into<String>,
) -> Result<Arc<dyn VectorIndex>, Error> {
    let collection_name = collection_name.into();
    match config.provider.as_str() {
        "qdrant" => {
            let index = QdrantIndexBuilder::from_config(config.clone(), collection_name)
                .build()
                .await?;
            Ok(Arc::new(index) as Arc<dyn VectorIndex>)
        }
        "mock" => Ok(Arc::new(InMemoryVectorIndex::new(collection_name)) as Arc<dyn VectorIndex>),
        other => Err(StorageError::InvalidConfig(format!(
            "Unknown storage provider '{other}'"
        ))
        .into()),
    }
}
