use super::QdrantIndex;
use crate::error::StorageError;
use codeeval_core::{config::StorageConfig, Error};
use qdrant_client::Qdrant;
use std::time::Duration;
use tracing::debug;

/// Builder for QdrantIndex
pub(crate) struct QdrantIndexBuilder {
    config: StorageConfig,
    collection_name: String,
}

impl QdrantIndexBuilder {
    /// Create a new builder with the given configuration
    pub(crate) fn from_config(config: StorageConfig, collection_name: impl Into<String>) -> Self {
        Self {
            config,
            collection_name: collection_name.into(),
        }
    }

    /// Build and connect to Qdrant
    pub(crate) async fn build(self) -> Result<QdrantIndex, Error> {
        let url = format!("http://{}:{}", self.config.host, self.config.port);
        debug!("Connecting to Qdrant at {url}");

        let mut client_config = qdrant_client::config::QdrantConfig::from_url(&url);
        client_config.timeout = Duration::from_millis(self.config.timeout_ms);

        // Add API key if provided (for Qdrant Cloud)
        if let Some(api_key) = &self.config.api_key {
            client_config.api_key = Some(api_key.clone());
        }

        let client = Qdrant::new(client_config)
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        // Verify connection is alive
        client
            .health_check()
            .await
            .map_err(|e| StorageError::ConnectionFailed(format!("Health check failed: {e}")))?;

        Ok(QdrantIndex {
            client,
            collection_name: self.collection_name,
            upsert_batch_size: self.config.upsert_batch_size.max(1),
        })
    }
}
