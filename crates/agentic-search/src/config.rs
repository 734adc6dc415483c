//! Configuration for the external query tool

use crate::error::{AgenticSearchError, Result};
use codeeval_core::AgenticConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything needed to run the query tool against one codebase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryToolConfig {
    pub command: String,
    pub args: Vec<String>,
    pub codebase: PathBuf,
    pub workspace_dir: Option<String>,
    pub max_files: usize,
    pub timeout_secs: u64,
    pub excluded_prefixes: Vec<String>,
}

impl QueryToolConfig {
    pub fn from_app_config(config: &AgenticConfig, codebase: impl Into<PathBuf>) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            codebase: codebase.into(),
            workspace_dir: config.workspace_dir.clone(),
            max_files: config.max_files,
            timeout_secs: config.timeout_secs,
            excluded_prefixes: config.excluded_prefixes.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Display form of the invocation, e.g. `brv query`
    pub fn tool_name(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(AgenticSearchError::Config(
                "agentic.command cannot be empty".to_string(),
            ));
        }
        if self.max_files == 0 {
            return Err(AgenticSearchError::Config(
                "agentic.max_files must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(AgenticSearchError::Config(
                "agentic.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check the codebase exists and, if configured, that the tool's workspace was initialised
    pub fn verify_workspace(&self) -> Result<()> {
        if !self.codebase.is_dir() {
            return Err(AgenticSearchError::Config(format!(
                "Codebase not found at {}",
                self.codebase.display()
            )));
        }
        if let Some(workspace) = self.workspace_path() {
            if !workspace.is_dir() {
                return Err(AgenticSearchError::Config(format!(
                    "{} not initialized in {}. Run '{} init' first",
                    self.command,
                    self.codebase.display(),
                    self.command
                )));
            }
        }
        Ok(())
    }

    pub fn workspace_path(&self) -> Option<PathBuf> {
        self.workspace_dir
            .as_deref()
            .map(|dir| self.codebase.join(Path::new(dir)))
    }
}
