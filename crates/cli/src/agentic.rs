//! `codeeval agentic`: evaluate the external agentic search tool

use anyhow::{Context, Result};
use codeeval_agentic_search::{
    AgenticStrategy, CitationExtractor, CommandQueryClient, QueryToolConfig,
};
use codeeval_core::{default_token_counter, load_corpus, Benchmark, Config};
use codeeval_evals::{run_strategy, EvaluationContext, StrategyRun};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Slack on top of the tool's own timeout so the tool's error wins
const HARNESS_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct AgenticArgs {
    pub codebase: PathBuf,
    pub questions: PathBuf,
    pub output: PathBuf,
    pub max_files: Option<usize>,
    pub timeout_secs: Option<u64>,
}

/// The tool invocation for this run, CLI overrides applied
pub fn tool_config(config: &Config, args: &AgenticArgs) -> QueryToolConfig {
    let mut tool = QueryToolConfig::from_app_config(&config.agentic, &args.codebase);
    if let Some(max_files) = args.max_files {
        tool.max_files = max_files;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        tool.timeout_secs = timeout_secs;
    }
    tool
}

pub async fn run_agentic(config: &Config, args: &AgenticArgs) -> Result<StrategyRun> {
    let tool = tool_config(config, args);
    tool.validate()?;
    tool.verify_workspace()?;

    let benchmark = Benchmark::load(&args.questions)
        .with_context(|| format!("Failed to load {}", args.questions.display()))?;

    let client = CommandQueryClient::new(&tool);
    client
        .check_available()
        .await
        .with_context(|| format!("'{}' is not usable", tool.tool_name()))?;

    // The corpus only answers "does this cited path exist"
    let token_counter = default_token_counter();
    let corpus = load_corpus(&args.codebase, &config.corpus, token_counter.as_ref())?;
    let root = std::fs::canonicalize(&args.codebase)
        .with_context(|| format!("Failed to resolve {}", args.codebase.display()))?;
    info!(
        "Resolving citations against {} files under {}",
        corpus.len(),
        root.display()
    );

    let strategy = AgenticStrategy::new(
        Arc::new(client),
        Arc::new(corpus),
        token_counter,
        tool.max_files,
        tool.excluded_prefixes.clone(),
    )
    .with_extractor(CitationExtractor::default().with_root(root.to_string_lossy()));

    let context = EvaluationContext::new(Arc::new(benchmark), &config.evaluation)
        .with_question_timeout(tool.timeout() + HARNESS_TIMEOUT_MARGIN);

    let run = run_strategy(&context, &strategy).await?;
    run.save(&args.output)
        .with_context(|| format!("Failed to save results to {}", args.output.display()))?;
    info!("Results saved to {}", args.output.display());
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(max_files: Option<usize>, timeout_secs: Option<u64>) -> AgenticArgs {
        AgenticArgs {
            codebase: PathBuf::from("./gemini-cli"),
            questions: PathBuf::from("./questions.json"),
            output: PathBuf::from("./results/agentic_results.json"),
            max_files,
            timeout_secs,
        }
    }

    #[test]
    fn test_tool_config_uses_configured_defaults() {
        let tool = tool_config(&Config::default(), &args(None, None));
        assert_eq!(tool.max_files, 10);
        assert_eq!(tool.timeout_secs, 60);
        assert_eq!(tool.codebase, PathBuf::from("./gemini-cli"));
    }

    #[test]
    fn test_tool_config_applies_overrides() {
        let tool = tool_config(&Config::default(), &args(Some(3), Some(15)));
        assert_eq!(tool.max_files, 3);
        assert_eq!(tool.timeout(), Duration::from_secs(15));
    }
}
