use codeeval_core::config::{Config, StorageConfig};

#[test]
fn test_storage_config_defaults() {
    let config = StorageConfig::default();
    assert_eq!(config.provider, "qdrant");
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 6334);
    assert_eq!(config.collection_name, "codeeval_code");
    assert_eq!(config.timeout_ms, 30000);
    assert_eq!(config.upsert_batch_size, 10);
}

#[test]
fn test_config_validation_storage_provider() {
    let mut config = Config::default();

    config.storage.provider = "qdrant".to_string();
    assert!(config.validate().is_ok());

    config.storage.provider = "mock".to_string();
    assert!(config.validate().is_ok());

    config.storage.provider = "invalid".to_string();
    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Invalid storage provider"));
}

#[test]
fn test_config_validation_top_k_bounds() {
    let mut config = Config::default();

    config.rag.top_k = 1;
    assert!(config.validate().is_ok());

    config.rag.top_k = 1000;
    assert!(config.validate().is_ok());

    config.rag.top_k = 1001;
    assert!(config.validate().is_err());
}

#[test]
fn test_agentic_defaults() {
    let config = Config::default();
    assert_eq!(config.agentic.command, "brv");
    assert_eq!(config.agentic.args, vec!["query".to_string()]);
    assert_eq!(config.agentic.max_files, 10);
    assert_eq!(config.agentic.excluded_prefixes, vec![".brv/".to_string()]);
}
