//! Embedding generation for corpus files and questions
//!
//! This crate provides the embedding collaborator used by the similarity
//! strategy: an OpenAI-compatible API provider, a deterministic mock, and an
//! [`EmbeddingManager`] that layers the injected retry policy on top.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use codeeval_core::config::EmbeddingsConfig;
use std::sync::Arc;
use tracing::info;

mod api_provider;
pub mod error;
mod mock_provider;
pub mod provider;
pub mod retry;

pub use api_provider::OpenAiApiProvider;
pub use error::EmbeddingError;
pub use mock_provider::MockEmbeddingProvider;
pub use provider::{EmbeddingProvider, EmbeddingTask};
pub use retry::{with_retry, ExponentialBackoff, NoRetry, RetryPolicy};

/// Provider type selected by `embeddings.provider`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderType {
    OpenAi,
    Mock,
}

impl EmbeddingProviderType {
    pub fn parse(provider: &str) -> error::Result<Self> {
        match provider.to_lowercase().as_str() {
            "openai" | "api" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            other => Err(EmbeddingError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Create an embedding manager from the application configuration
///
/// The API key is taken from the config, then `EMBEDDING_API_KEY`, then
/// `OPENAI_API_KEY`.
pub fn create_embedding_manager_from_app_config(
    config: &codeeval_core::Config,
) -> codeeval_core::Result<Arc<EmbeddingManager>> {
    let manager = EmbeddingManager::from_config(
        &config.embeddings,
        config.resolve_embedding_api_key(),
    )?;
    Ok(Arc::new(manager))
}

/// Provider plus retry policy, shared by the indexer and the retriever
pub struct EmbeddingManager {
    provider: Arc<dyn EmbeddingProvider>,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl EmbeddingManager {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        Self {
            provider,
            retry_policy,
        }
    }

    /// Initialize manager from configuration
    pub fn from_config(config: &EmbeddingsConfig, api_key: Option<String>) -> error::Result<Self> {
        let provider: Arc<dyn EmbeddingProvider> =
            match EmbeddingProviderType::parse(&config.provider)? {
                EmbeddingProviderType::OpenAi => {
                    Arc::new(OpenAiApiProvider::new(config, api_key)?)
                }
                EmbeddingProviderType::Mock => {
                    info!("Using mock embeddings ({} dims)", config.embedding_dimension);
                    Arc::new(MockEmbeddingProvider::new(config.embedding_dimension))
                }
            };

        Ok(Self::new(
            provider,
            Arc::new(ExponentialBackoff::from_config(config)),
        ))
    }

    /// Get reference to the embedding provider
    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn embedding_dimension(&self) -> usize {
        self.provider.embedding_dimension()
    }

    /// Generate embeddings, retrying per the configured policy
    pub async fn embed(
        &self,
        texts: Vec<String>,
        task: EmbeddingTask,
    ) -> error::Result<Vec<Option<Vec<f32>>>> {
        with_retry(self.retry_policy.as_ref(), || {
            self.provider.embed(texts.clone(), task)
        })
        .await
    }

    /// Embed a single question
    pub async fn embed_query(&self, text: &str) -> error::Result<Vec<f32>> {
        let mut embeddings = self
            .embed(vec![text.to_string()], EmbeddingTask::Query)
            .await?;
        embeddings
            .pop()
            .flatten()
            .ok_or_else(|| EmbeddingError::Rejected("query produced no embedding".to_string()))
    }
}
