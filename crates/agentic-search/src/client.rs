//! Clients for the external agentic query tool

use crate::config::QueryToolConfig;
use crate::error::{AgenticSearchError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

const MAX_STDERR_CHARS: usize = 500;

/// Sends one prompt to an agentic code-search tool and returns its free-text answer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgenticQueryClient: Send + Sync {
    async fn query(&self, prompt: &str) -> Result<String>;

    /// Display name recorded in result files
    fn tool_name(&self) -> String;
}

/// Runs the tool as a child process inside the codebase directory
///
/// The prompt is passed as the final argument. The child is killed if the
/// timeout elapses or the future is dropped.
#[derive(Debug, Clone)]
pub struct CommandQueryClient {
    command: String,
    args: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
}

impl CommandQueryClient {
    pub fn new(config: &QueryToolConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            working_dir: config.codebase.clone(),
            timeout: config.timeout(),
        }
    }

    /// Check the tool can be launched at all (`<command> --help`)
    pub async fn check_available(&self) -> Result<()> {
        let output = Command::new(&self.command)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(Duration::from_secs(10), output).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                Err(AgenticSearchError::ToolNotFound(self.command.clone()))
            }
            Ok(Err(e)) => Err(AgenticSearchError::Io(e)),
            Err(_) => Err(AgenticSearchError::Timeout(10)),
        }
    }
}

#[async_trait]
impl AgenticQueryClient for CommandQueryClient {
    async fn query(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let child = Command::new(&self.command)
            .args(&self.args)
            .arg(prompt)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(AgenticSearchError::ToolNotFound(self.command.clone()))
            }
            Ok(Err(e)) => return Err(AgenticSearchError::Io(e)),
            Err(_) => {
                warn!(
                    "'{}' did not answer within {}s",
                    self.tool_name(),
                    self.timeout.as_secs()
                );
                return Err(AgenticSearchError::Timeout(self.timeout.as_secs()));
            }
        };

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .trim()
                .chars()
                .take(MAX_STDERR_CHARS)
                .collect();
            return Err(AgenticSearchError::ToolFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let response = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(
            "'{}' answered with {} bytes in {:.2}s",
            self.tool_name(),
            response.len(),
            start.elapsed().as_secs_f64()
        );

        if response.trim().is_empty() {
            return Err(AgenticSearchError::EmptyResponse);
        }
        Ok(response)
    }

    fn tool_name(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn client(command: &str, args: &[&str], timeout_secs: u64) -> CommandQueryClient {
        CommandQueryClient {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            working_dir: std::env::temp_dir(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[tokio::test]
    async fn test_prompt_is_last_argument() {
        let response = client("echo", &["FILE:"], 5)
            .query("src/main.rs")
            .await
            .expect("echo succeeds");
        assert_eq!(response.trim(), "FILE: src/main.rs");
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let err = client("codeeval-no-such-tool", &[], 5)
            .query("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AgenticSearchError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit() {
        let err = client("sh", &["-c", "echo boom >&2; exit 3", "sh"], 5)
            .query("ignored")
            .await
            .unwrap_err();
        match err {
            AgenticSearchError::ToolFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = client("sleep", &[], 1).query("5").await.unwrap_err();
        assert!(matches!(err, AgenticSearchError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_empty_response() {
        let err = client("true", &[], 5).query("x").await.unwrap_err();
        assert!(matches!(err, AgenticSearchError::EmptyResponse));
    }
}
