//! Library interface for the codeeval CLI
//!
//! Each subcommand is a plain async function over a loaded [`Config`], so the
//! commands can be driven from integration tests with the mock providers.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod agentic;
pub mod compare;
pub mod rag;

pub use anyhow::Result;
pub use codeeval_core::config::Config;

use anyhow::Context;
use std::fs;
use std::path::Path;

pub use agentic::{run_agentic, AgenticArgs};
pub use compare::{run_compare, CompareArgs};
pub use rag::{run_rag, IndexMode, RagArgs};

/// Load the layered configuration and validate it
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load(config_path).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Write `content` to `path`, creating missing parent directories
pub fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
