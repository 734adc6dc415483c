//! `codeeval compare`: compare two saved strategy runs

use crate::write_report;
use anyhow::{Context, Result};
use codeeval_evals::{
    compare, render_console_table, render_markdown, ComparisonSummary, StrategyRun,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CompareArgs {
    pub rag_results: PathBuf,
    pub agentic_results: PathBuf,
    pub markdown_report: PathBuf,
    pub json_summary: PathBuf,
}

/// Compare the runs, write both reports and return the console table
pub fn run_compare(args: &CompareArgs) -> Result<(ComparisonSummary, String)> {
    let rag = StrategyRun::load(&args.rag_results).with_context(|| {
        format!(
            "Failed to load RAG results from {}",
            args.rag_results.display()
        )
    })?;
    let agentic = StrategyRun::load(&args.agentic_results).with_context(|| {
        format!(
            "Failed to load agentic results from {}",
            args.agentic_results.display()
        )
    })?;

    let summary = compare(&rag, &agentic)?;

    write_report(&args.markdown_report, &render_markdown(&summary))?;
    info!("Markdown report saved to {}", args.markdown_report.display());
    summary
        .save(&args.json_summary)
        .with_context(|| format!("Failed to write {}", args.json_summary.display()))?;
    info!("JSON summary saved to {}", args.json_summary.display());

    let table = render_console_table(&summary);
    Ok((summary, table))
}
