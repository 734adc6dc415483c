//! Configuration module for codeeval
//!
//! Configuration can be loaded from TOML files and/or environment variables.
//! Every section has serde defaults, so an empty file is a valid configuration.

mod defaults;
mod loading;
mod storage;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "codeeval.toml";

/// Returns the path of the configuration file used when `--config` is absent
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Corpus discovery configuration
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Embeddings configuration
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    /// Vector index configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Similarity retrieval configuration
    #[serde(default)]
    pub rag: RagConfig,

    /// External agentic tool configuration
    #[serde(default)]
    pub agentic: AgenticConfig,

    /// Evaluation harness configuration
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// Which files under the codebase root become corpus entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// File extensions to index, without the leading dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names skipped anywhere in the tree
    #[serde(default = "default_ignore_dirs")]
    pub ignore_dirs: Vec<String>,

    /// Also honour `.gitignore` files found in the tree
    #[serde(default = "default_respect_gitignore")]
    pub respect_gitignore: bool,

    /// Files larger than this are skipped
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_dirs: default_ignore_dirs(),
            respect_gitignore: default_respect_gitignore(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

/// Configuration for embeddings generation
///
/// # Providers
/// - `openai` (default): OpenAI or any OpenAI-compatible endpoint, key from `OPENAI_API_KEY`
/// - `mock`: deterministic hashed embeddings for tests and dry runs
#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    /// Provider type: "openai" (default), "mock"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model name to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Option<String>,

    /// API key (or use OPENAI_API_KEY / EMBEDDING_API_KEY env vars)
    pub api_key: Option<String>,

    /// Embedding dimension size
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Number of texts sent in a single embedding API request
    #[serde(default = "default_texts_per_api_request")]
    pub texts_per_api_request: usize,

    /// Maximum concurrent embedding API requests
    #[serde(default = "default_max_concurrent_api_requests")]
    pub max_concurrent_api_requests: usize,

    /// Inputs longer than this are truncated before embedding
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Number of retry attempts for transient failures
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,

    /// First backoff delay; doubles on every retry
    #[serde(default = "default_retry_initial_backoff_ms")]
    pub retry_initial_backoff_ms: u64,

    /// Upper bound for a single backoff delay
    #[serde(default = "default_retry_max_backoff_ms")]
    pub retry_max_backoff_ms: u64,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_base_url: default_api_base_url(),
            api_key: None,
            embedding_dimension: default_embedding_dimension(),
            texts_per_api_request: default_texts_per_api_request(),
            max_concurrent_api_requests: default_max_concurrent_api_requests(),
            max_input_chars: default_max_input_chars(),
            retry_attempts: default_retry_attempts(),
            retry_initial_backoff_ms: default_retry_initial_backoff_ms(),
            retry_max_backoff_ms: default_retry_max_backoff_ms(),
        }
    }
}

impl std::fmt::Debug for EmbeddingsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("embedding_dimension", &self.embedding_dimension)
            .field("texts_per_api_request", &self.texts_per_api_request)
            .field(
                "max_concurrent_api_requests",
                &self.max_concurrent_api_requests,
            )
            .field("max_input_chars", &self.max_input_chars)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_initial_backoff_ms", &self.retry_initial_backoff_ms)
            .field("retry_max_backoff_ms", &self.retry_max_backoff_ms)
            .finish()
    }
}

/// Configuration for the vector index backend
#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Provider type: "qdrant" (default), "mock"
    #[serde(default = "default_storage_provider")]
    pub provider: String,

    /// Qdrant host address
    #[serde(default = "default_qdrant_host")]
    pub host: String,

    /// Qdrant gRPC port
    #[serde(default = "default_qdrant_port")]
    pub port: u16,

    /// API key (Qdrant Cloud)
    pub api_key: Option<String>,

    /// Collection holding one vector per corpus file
    #[serde(default = "default_collection_name")]
    pub collection_name: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_storage_timeout_ms")]
    pub timeout_ms: u64,

    /// Points per upsert request
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            host: default_qdrant_host(),
            port: default_qdrant_port(),
            api_key: None,
            collection_name: default_collection_name(),
            timeout_ms: default_storage_timeout_ms(),
            upsert_batch_size: default_upsert_batch_size(),
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("provider", &self.provider)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("collection_name", &self.collection_name)
            .field("timeout_ms", &self.timeout_ms)
            .field("upsert_batch_size", &self.upsert_batch_size)
            .finish()
    }
}

/// Configuration for the similarity-search strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Fixed number of files retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

/// Configuration for the external agentic query tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgenticConfig {
    /// Executable invoked once per question
    #[serde(default = "default_agentic_command")]
    pub command: String,

    /// Arguments placed before the prompt
    #[serde(default = "default_agentic_args")]
    pub args: Vec<String>,

    /// Directory (relative to the codebase) that must exist before querying
    #[serde(default = "default_agentic_workspace_dir")]
    pub workspace_dir: Option<String>,

    /// Maximum number of cited files kept per question
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Per-question timeout for the external tool
    #[serde(default = "default_agentic_timeout_secs")]
    pub timeout_secs: u64,

    /// Cited paths starting with any of these prefixes are discarded
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

impl Default for AgenticConfig {
    fn default() -> Self {
        Self {
            command: default_agentic_command(),
            args: default_agentic_args(),
            workspace_dir: default_agentic_workspace_dir(),
            max_files: default_max_files(),
            timeout_secs: default_agentic_timeout_secs(),
            excluded_prefixes: default_excluded_prefixes(),
        }
    }
}

/// Configuration for the per-question evaluation loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Questions evaluated concurrently
    #[serde(default = "default_max_concurrent_questions")]
    pub max_concurrent_questions: usize,

    /// Time budget for a single retrieval before the question is marked failed
    #[serde(default = "default_question_timeout_secs")]
    pub question_timeout_secs: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_concurrent_questions: default_max_concurrent_questions(),
            question_timeout_secs: default_question_timeout_secs(),
        }
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.corpus.extensions.is_empty() {
            return Err(Error::config(
                "corpus.extensions must list at least one extension",
            ));
        }
        if self.corpus.max_file_bytes == 0 {
            return Err(Error::config(
                "corpus.max_file_bytes must be greater than 0",
            ));
        }

        let valid_embedding_providers = ["openai", "mock"];
        if !valid_embedding_providers.contains(&self.embeddings.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid embeddings provider '{}'. Must be one of: {:?}",
                self.embeddings.provider, valid_embedding_providers
            )));
        }
        if self.embeddings.embedding_dimension == 0 {
            return Err(Error::config(
                "embeddings.embedding_dimension must be greater than 0",
            ));
        }
        if self.embeddings.texts_per_api_request == 0 {
            return Err(Error::config(
                "embeddings.texts_per_api_request must be greater than 0",
            ));
        }
        if self.embeddings.texts_per_api_request > 2048 {
            return Err(Error::config(format!(
                "embeddings.texts_per_api_request too large (max 2048, got {})",
                self.embeddings.texts_per_api_request
            )));
        }
        if self.embeddings.max_concurrent_api_requests == 0 {
            return Err(Error::config(
                "embeddings.max_concurrent_api_requests must be greater than 0",
            ));
        }
        if self.embeddings.max_concurrent_api_requests > 64 {
            return Err(Error::config(format!(
                "embeddings.max_concurrent_api_requests too large (max 64, got {})",
                self.embeddings.max_concurrent_api_requests
            )));
        }
        if self.embeddings.max_input_chars == 0 {
            return Err(Error::config(
                "embeddings.max_input_chars must be greater than 0",
            ));
        }
        if self.embeddings.retry_initial_backoff_ms > self.embeddings.retry_max_backoff_ms {
            return Err(Error::config(format!(
                "embeddings.retry_initial_backoff_ms ({}) cannot exceed retry_max_backoff_ms ({})",
                self.embeddings.retry_initial_backoff_ms, self.embeddings.retry_max_backoff_ms
            )));
        }

        let valid_storage_providers = ["qdrant", "mock"];
        if !valid_storage_providers.contains(&self.storage.provider.as_str()) {
            return Err(Error::config(format!(
                "Invalid storage provider '{}'. Must be one of: {:?}",
                self.storage.provider, valid_storage_providers
            )));
        }
        if self.storage.collection_name.is_empty() {
            return Err(Error::config("storage.collection_name cannot be empty"));
        }
        if self.storage.upsert_batch_size == 0 {
            return Err(Error::config(
                "storage.upsert_batch_size must be greater than 0",
            ));
        }

        if self.rag.top_k == 0 {
            return Err(Error::config("rag.top_k must be greater than 0"));
        }
        if self.rag.top_k > 1000 {
            return Err(Error::config(format!(
                "rag.top_k too large (max 1000, got {})",
                self.rag.top_k
            )));
        }

        if self.agentic.command.trim().is_empty() {
            return Err(Error::config("agentic.command cannot be empty"));
        }
        if self.agentic.max_files == 0 {
            return Err(Error::config("agentic.max_files must be greater than 0"));
        }
        if self.agentic.timeout_secs == 0 {
            return Err(Error::config(
                "agentic.timeout_secs must be greater than 0",
            ));
        }

        if self.evaluation.max_concurrent_questions == 0 {
            return Err(Error::config(
                "evaluation.max_concurrent_questions must be greater than 0",
            ));
        }
        if self.evaluation.question_timeout_secs == 0 {
            return Err(Error::config(
                "evaluation.question_timeout_secs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Saves the configuration to a TOML file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, toml_string)
            .map_err(|e| Error::config(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
