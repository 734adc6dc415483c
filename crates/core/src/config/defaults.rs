//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_EMBEDDING_PROVIDER: &str = "openai";
pub(crate) const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub(crate) const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub(crate) const DEFAULT_STORAGE_PROVIDER: &str = "qdrant";
pub(crate) const DEFAULT_QDRANT_HOST: &str = "localhost";
pub(crate) const DEFAULT_COLLECTION_NAME: &str = "codeeval_code";
pub(crate) const DEFAULT_AGENTIC_COMMAND: &str = "brv";
pub(crate) const DEFAULT_AGENTIC_WORKSPACE_DIR: &str = ".brv";

pub(crate) fn default_extensions() -> Vec<String> {
    [
        // Code
        "ts", "tsx", "js", "jsx", "mjs", "cjs", // Config
        "json", "toml", "yaml", "yml", // Scripts
        "sh",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub(crate) fn default_ignore_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "dist",
        "build",
        ".next",
        ".cache",
        "__pycache__",
        "coverage",
        ".vscode",
        ".idea",
        "qdrant_storage",
        ".brv",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub(crate) fn default_respect_gitignore() -> bool {
    false
}

pub(crate) fn default_max_file_bytes() -> u64 {
    10 * 1024 * 1024
}

pub(crate) fn default_embedding_provider() -> String {
    DEFAULT_EMBEDDING_PROVIDER.to_string()
}

pub(crate) fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

pub(crate) fn default_api_base_url() -> Option<String> {
    Some(DEFAULT_API_BASE_URL.to_string())
}

pub(crate) fn default_embedding_dimension() -> usize {
    1536 // text-embedding-3-small
}

pub(crate) fn default_texts_per_api_request() -> usize {
    10
}

pub(crate) fn default_max_concurrent_api_requests() -> usize {
    4
}

/// Roughly 8191 tokens at ~4 chars per token
pub(crate) fn default_max_input_chars() -> usize {
    32_000
}

pub(crate) fn default_retry_attempts() -> usize {
    5
}

pub(crate) fn default_retry_initial_backoff_ms() -> u64 {
    1_000
}

pub(crate) fn default_retry_max_backoff_ms() -> u64 {
    60_000
}

pub(crate) fn default_storage_provider() -> String {
    DEFAULT_STORAGE_PROVIDER.to_string()
}

pub(crate) fn default_qdrant_host() -> String {
    DEFAULT_QDRANT_HOST.to_string()
}

pub(crate) fn default_qdrant_port() -> u16 {
    6334
}

pub(crate) fn default_collection_name() -> String {
    DEFAULT_COLLECTION_NAME.to_string()
}

pub(crate) fn default_storage_timeout_ms() -> u64 {
    30_000
}

pub(crate) fn default_upsert_batch_size() -> usize {
    10
}

pub(crate) fn default_top_k() -> usize {
    5
}

pub(crate) fn default_agentic_command() -> String {
    DEFAULT_AGENTIC_COMMAND.to_string()
}

pub(crate) fn default_agentic_args() -> Vec<String> {
    vec!["query".to_string()]
}

pub(crate) fn default_agentic_workspace_dir() -> Option<String> {
    Some(DEFAULT_AGENTIC_WORKSPACE_DIR.to_string())
}

pub(crate) fn default_max_files() -> usize {
    10
}

pub(crate) fn default_agentic_timeout_secs() -> u64 {
    60
}

pub(crate) fn default_excluded_prefixes() -> Vec<String> {
    vec![".brv/".to_string()]
}

pub(crate) fn default_max_concurrent_questions() -> usize {
    1
}

pub(crate) fn default_question_timeout_secs() -> u64 {
    120
}
