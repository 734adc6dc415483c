//! Error types for the embeddings module

use async_openai::error::OpenAIError;
use thiserror::Error;

/// Result type for embedding operations
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur during embedding operations
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Rate limited by the provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network or transport failure; the request may not have reached the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider-side failure (5xx and similar)
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Vector length differs from the configured dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Response did not contain one vector per input
    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// Unsupported provider
    #[error("Unsupported embedding provider: {0}")]
    UnsupportedProvider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EmbeddingError {
    /// Whether repeating the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Transport(_) | Self::Unavailable(_)
        )
    }
}

impl From<OpenAIError> for EmbeddingError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Reqwest(e) => Self::Transport(e.to_string()),
            OpenAIError::StreamError(e) => Self::Transport(e.to_string()),
            OpenAIError::ApiError(api) => {
                let kind = api
                    .r#type
                    .as_deref()
                    .or(api.code.as_deref())
                    .unwrap_or_default()
                    .to_string();
                if kind.contains("rate_limit") || kind.contains("insufficient_quota") {
                    Self::RateLimited(api.message)
                } else if kind.contains("server_error") || kind.contains("overloaded") {
                    Self::Unavailable(api.message)
                } else {
                    Self::Rejected(api.message)
                }
            }
            other => Self::Rejected(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for codeeval_core::error::Error {
    fn from(err: EmbeddingError) -> Self {
        codeeval_core::error::Error::Embedding(err.to_string())
    }
}
