//! Error types for agentic search operations

use codeeval_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgenticSearchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Query tool '{0}' not found on PATH")]
    ToolNotFound(String),

    #[error("Query tool exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("Query tool returned an empty response")]
    EmptyResponse,

    #[error("Query tool timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgenticSearchError>;

impl From<AgenticSearchError> for CoreError {
    fn from(err: AgenticSearchError) -> Self {
        match err {
            AgenticSearchError::Timeout(seconds) => CoreError::timeout("agentic query", seconds),
            AgenticSearchError::Config(msg) => CoreError::config(msg),
            other => CoreError::agentic_tool(other.to_string()),
        }
    }
}
