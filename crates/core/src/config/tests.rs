//! Tests for configuration module

use super::*;
use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn create_temp_config_file(content: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .map_err(|e| Error::config(format!("Failed to create temp file: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::config(format!("Failed to write temp file: {e}")))?;
    file.flush()
        .map_err(|e| Error::config(format!("Failed to flush temp file: {e}")))?;
    Ok(file)
}

#[test]
fn test_from_toml_str_valid() {
    let toml = r#"
        [embeddings]
        provider = "mock"
        model = "test-model"
        embedding_dimension = 64

        [rag]
        top_k = 10

        [agentic]
        max_files = 7
    "#;

    let config = Config::from_toml_str(toml).expect("Failed to parse valid TOML");
    assert_eq!(config.embeddings.provider, "mock");
    assert_eq!(config.embeddings.embedding_dimension, 64);
    assert_eq!(config.rag.top_k, 10);
    assert_eq!(config.agentic.max_files, 7);
    // Untouched fields keep their defaults
    assert_eq!(config.agentic.command, "brv");
    assert_eq!(config.storage.port, 6334);
}

#[test]
fn test_from_toml_str_empty_uses_defaults() {
    let config = Config::from_toml_str("").expect("Failed to parse empty TOML");
    assert_eq!(config.embeddings.provider, "openai");
    assert_eq!(config.embeddings.model, "text-embedding-3-small");
    assert_eq!(config.embeddings.embedding_dimension, 1536);
    assert_eq!(config.rag.top_k, 5);
    assert_eq!(config.agentic.max_files, 10);
    assert_eq!(config.agentic.timeout_secs, 60);
    assert!(config.corpus.extensions.contains(&"ts".to_string()));
    assert!(config.corpus.ignore_dirs.contains(&"node_modules".to_string()));
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_str_invalid_syntax() {
    let toml = r#"
        [embeddings
        provider = "openai"
    "#;

    let result = Config::from_toml_str(toml);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse TOML"));
}

#[test]
fn test_validate_rejects_zero_top_k() {
    let mut config = Config::default();
    config.rag.top_k = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("rag.top_k"));
}

#[test]
fn test_validate_rejects_unknown_providers() {
    let mut config = Config::default();
    config.embeddings.provider = "bogus".to_string();
    assert!(config
        .validate()
        .unwrap_err()
        .to_string()
        .contains("Invalid embeddings provider"));

    let mut config = Config::default();
    config.storage.provider = "bogus".to_string();
    assert!(config
        .validate()
        .unwrap_err()
        .to_string()
        .contains("Invalid storage provider"));
}

#[test]
fn test_validate_rejects_inverted_backoff() {
    let mut config = Config::default();
    config.embeddings.retry_initial_backoff_ms = 10_000;
    config.embeddings.retry_max_backoff_ms = 1_000;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_concurrency() {
    let mut config = Config::default();
    config.evaluation.max_concurrent_questions = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.embeddings.max_concurrent_api_requests = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_from_file_reads_toml() {
    let file = create_temp_config_file(
        r#"
        [storage]
        provider = "mock"
        collection_name = "bench"
    "#,
    )
    .expect("Failed to create config file");

    let config = Config::from_file(file.path()).expect("Failed to load config");
    assert_eq!(config.storage.provider, "mock");
    assert_eq!(config.storage.collection_name, "bench");
}

#[test]
fn test_from_file_missing_file_uses_defaults() {
    let config = Config::from_file(Path::new("/nonexistent/codeeval.toml"))
        .expect("Missing file should fall back to defaults");
    assert_eq!(config.rag.top_k, 5);
}

#[test]
fn test_load_rejects_missing_explicit_path() {
    let result = Config::load(Some(Path::new("/nonexistent/custom.toml")));
    assert!(result.is_err());
}

#[test]
fn test_debug_redacts_secrets() {
    let mut config = Config::default();
    config.embeddings.api_key = Some("sk-secret-123".to_string());
    config.storage.api_key = Some("qdrant-secret-456".to_string());
    let debug_output = format!("{config:?}");
    assert!(!debug_output.contains("sk-secret-123"));
    assert!(!debug_output.contains("qdrant-secret-456"));
    assert!(debug_output.contains("***REDACTED***"));
}

#[test]
fn test_save_round_trips_through_toml() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("codeeval.toml");
    let mut config = Config::default();
    config.rag.top_k = 12;
    config.save(&path).expect("Failed to save config");

    let loaded = Config::from_file(&path).expect("Failed to reload config");
    assert_eq!(loaded.rag.top_k, 12);
}

#[test]
fn test_generate_collection_name_is_deterministic() {
    let name1 = StorageConfig::generate_collection_name(Path::new("/tmp/some-repo"))
        .expect("Failed to generate name");
    let name2 = StorageConfig::generate_collection_name(Path::new("/tmp/some-repo"))
        .expect("Failed to generate name");
    let other = StorageConfig::generate_collection_name(Path::new("/tmp/other repo"))
        .expect("Failed to generate name");

    assert_eq!(name1, name2);
    assert_ne!(name1, other);
    assert!(name1.starts_with("some-repo_"));
    assert!(other.starts_with("other_repo_"));
}

#[test]
fn test_resolve_collection_name() {
    let mut storage = StorageConfig::default();
    assert_eq!(
        storage
            .resolve_collection_name(Path::new("/tmp/x"))
            .expect("resolve"),
        "codeeval_code"
    );

    storage.collection_name = "auto".to_string();
    let resolved = storage
        .resolve_collection_name(Path::new("/tmp/x"))
        .expect("resolve");
    assert!(resolved.starts_with("x_"));
}
