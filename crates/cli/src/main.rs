//! codeeval CLI - RAG vs agentic code retrieval evaluation
//!
//! This binary runs each retrieval strategy over a question benchmark and
//! compares the saved runs.

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::Result;
use clap::{Parser, Subcommand};
use codeeval::{
    load_config, run_agentic, run_compare, run_rag, AgenticArgs, CompareArgs, IndexMode, RagArgs,
};
use codeeval_evals::render_run_summary;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const WORKSPACE_CRATES: &[&str] = &[
    "codeeval",
    "codeeval_core",
    "codeeval_embeddings",
    "codeeval_storage",
    "codeeval_indexer",
    "codeeval_agentic_search",
    "codeeval_evals",
];

#[derive(Parser)]
#[command(name = "codeeval")]
#[command(about = "Compare vector-similarity RAG against agentic search for code retrieval")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the codebase and evaluate vector similarity retrieval
    Rag {
        /// Path to codebase directory
        #[arg(long, default_value = "./gemini-cli")]
        codebase: PathBuf,
        /// Path to questions JSON file
        #[arg(long, default_value = "./questions.json")]
        questions: PathBuf,
        /// Path to output results JSON file
        #[arg(long, default_value = "./results/rag_results.json")]
        output: PathBuf,
        /// Only index the codebase, don't run evaluation
        #[arg(long, conflicts_with = "eval_only")]
        index_only: bool,
        /// Only run evaluation, assume the codebase is already indexed
        #[arg(long)]
        eval_only: bool,
        /// Number of top results to retrieve (defaults to rag.top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Evaluate the agentic search tool
    Agentic {
        /// Path to codebase directory
        #[arg(long, default_value = "./gemini-cli")]
        codebase: PathBuf,
        /// Path to questions JSON file
        #[arg(long, default_value = "./questions.json")]
        questions: PathBuf,
        /// Path to output results JSON file
        #[arg(long, default_value = "./results/agentic_results.json")]
        output: PathBuf,
        /// Maximum files to keep per answer (defaults to agentic.max_files)
        #[arg(long)]
        max_files: Option<usize>,
        /// Per-query timeout in seconds (defaults to agentic.timeout_secs)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Compare saved RAG and agentic results
    Compare {
        #[arg(long, default_value = "./results/rag_results.json")]
        rag_results: PathBuf,
        #[arg(long, default_value = "./results/agentic_results.json")]
        agentic_results: PathBuf,
        #[arg(long, default_value = "./results/comparison_report.md")]
        markdown_report: PathBuf,
        #[arg(long, default_value = "./results/comparison_summary.json")]
        json_summary: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Rag {
            codebase,
            questions,
            output,
            index_only,
            eval_only,
            top_k,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let args = RagArgs {
                codebase,
                questions,
                output,
                mode: IndexMode::from_flags(index_only, eval_only)?,
                top_k,
                show_progress: true,
            };
            if let Some(run) = run_rag(&config, &args).await? {
                println!("{}", render_run_summary(&run));
            }
        }
        Commands::Agentic {
            codebase,
            questions,
            output,
            max_files,
            timeout_secs,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let args = AgenticArgs {
                codebase,
                questions,
                output,
                max_files,
                timeout_secs,
            };
            let run = run_agentic(&config, &args).await?;
            println!("{}", render_run_summary(&run));
        }
        Commands::Compare {
            rag_results,
            agentic_results,
            markdown_report,
            json_summary,
        } => {
            let args = CompareArgs {
                rag_results,
                agentic_results,
                markdown_report,
                json_summary,
            };
            let (_, table) = run_compare(&args)?;
            println!("{table}");
        }
    }

    Ok(())
}

/// Initialize logging; `RUST_LOG` takes precedence over `--verbose`
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let directives = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives)),
        )
        .init();
}
