//! Storage-related configuration methods

use crate::error::{Error, Result};
use std::path::Path;

use super::StorageConfig;

/// Collection name value that asks for a name derived from the codebase path
pub const AUTO_COLLECTION_NAME: &str = "auto";

impl StorageConfig {
    /// Generate a collection name from a codebase path
    ///
    /// Format: `<sanitized_dir_name>_<xxhash3_128_hex>`. The directory name is
    /// sanitized (alphanumeric, dash, underscore only) and truncated to 50
    /// characters. The full absolute path is hashed, so the same codebase always
    /// maps to the same collection and two checkouts never share one.
    pub fn generate_collection_name(codebase_path: &Path) -> Result<String> {
        use twox_hash::XxHash3_128;

        let absolute_path = if codebase_path.is_absolute() {
            codebase_path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| Error::config(format!("Failed to get current dir: {e}")))?
                .join(codebase_path)
        };

        let normalized_path =
            std::fs::canonicalize(&absolute_path).unwrap_or_else(|_| absolute_path.clone());

        let dir_name = normalized_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::config(format!(
                    "Path {} has no valid filename component",
                    normalized_path.display()
                ))
            })?;

        let sanitized_name: String = dir_name
            .chars()
            .take(50)
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        let path_str = normalized_path.to_string_lossy();
        let hash = XxHash3_128::oneshot(path_str.as_bytes());

        Ok(format!("{sanitized_name}_{hash:032x}"))
    }

    /// The collection to use for `codebase_path`
    ///
    /// Returns the configured name, or a generated one when the configured
    /// name is [`AUTO_COLLECTION_NAME`].
    pub fn resolve_collection_name(&self, codebase_path: &Path) -> Result<String> {
        if self.collection_name == AUTO_COLLECTION_NAME {
            Self::generate_collection_name(codebase_path)
        } else {
            Ok(self.collection_name.clone())
        }
    }
}
