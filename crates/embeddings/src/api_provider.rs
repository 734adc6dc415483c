//! OpenAI-compatible API provider for embeddings

use crate::{
    error::{EmbeddingError, Result},
    provider::{EmbeddingProvider, EmbeddingTask},
};
use async_openai::types::{CreateEmbeddingRequest, EmbeddingInput};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use codeeval_core::config::EmbeddingsConfig;
use tracing::{debug, info, warn};

/// OpenAI-compatible API provider
///
/// Issues exactly one request per `embed` call. Over-long inputs are
/// truncated to `max_input_chars` characters rather than rejected.
pub struct OpenAiApiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: usize,
    max_input_chars: usize,
}

impl OpenAiApiProvider {
    /// Create a new API provider from configuration
    pub fn new(config: &EmbeddingsConfig, api_key: Option<String>) -> Result<Self> {
        let Some(api_key) = api_key else {
            return Err(EmbeddingError::Config(
                "No API key configured. Set OPENAI_API_KEY or embeddings.api_key".to_string(),
            ));
        };

        info!("Initializing OpenAI-compatible API embeddings");
        info!("  Model: {}", config.model);
        info!("  Dimensions: {}", config.embedding_dimension);
        info!("  Batch size: {}", config.texts_per_api_request);

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(ref base_url) = config.api_base_url {
            info!("  Base URL: {base_url}");
            openai_config = openai_config.with_api_base(base_url);
        }

        Ok(Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            dimensions: config.embedding_dimension,
            max_input_chars: config.max_input_chars,
        })
    }

    /// Check if the API is reachable (warns on failure, never blocks)
    pub async fn check_health(&self) -> bool {
        debug!("Checking API health via /models endpoint");

        match self.client.models().list().await {
            Ok(models_response) => {
                info!("API health check passed");
                debug!("  Available models: {}", models_response.data.len());
                true
            }
            Err(e) => {
                warn!("API health check failed: {e}");
                false
            }
        }
    }

    fn prepare(&self, text: &str) -> String {
        match text.char_indices().nth(self.max_input_chars) {
            Some((byte_idx, _)) => text[..byte_idx].to_string(),
            None => text.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiApiProvider {
    async fn embed(
        &self,
        texts: Vec<String>,
        _task: EmbeddingTask,
    ) -> Result<Vec<Option<Vec<f32>>>> {
        let mut all_embeddings = vec![None; texts.len()];

        // Empty strings are rejected by the API
        let (indices, inputs): (Vec<usize>, Vec<String>) = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| (i, self.prepare(text)))
            .unzip();

        if inputs.is_empty() {
            return Ok(all_embeddings);
        }

        let request = CreateEmbeddingRequest {
            model: self.model.clone(),
            input: EmbeddingInput::StringArray(inputs),
            encoding_format: None,
            dimensions: None,
            user: None,
        };

        let response = self.client.embeddings().create(request).await?;

        if response.data.len() != indices.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: indices.len(),
                actual: response.data.len(),
            });
        }

        let mut sorted_embeddings: Vec<(usize, Vec<f32>)> = response
            .data
            .into_iter()
            .map(|emb| (emb.index as usize, emb.embedding))
            .collect();
        sorted_embeddings.sort_by_key(|(idx, _)| *idx);

        for (orig_idx, (_, embedding)) in indices.into_iter().zip(sorted_embeddings) {
            if embedding.len() != self.dimensions {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: embedding.len(),
                });
            }
            all_embeddings[orig_idx] = Some(embedding);
        }

        Ok(all_embeddings)
    }

    fn embedding_dimension(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
