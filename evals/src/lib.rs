//! Retrieval evaluation for codeeval
//!
//! This crate provides:
//! - Set-overlap metrics (precision, recall, IoU) and their aggregation
//! - The harness that runs a retrieval strategy over a benchmark
//! - Comparison of a RAG run with an agentic run, rendered as JSON, Markdown and console tables

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod comparison;
pub mod harness;
pub mod metrics;
pub mod report;

pub use comparison::{compare, ComparisonSummary, Metric, MetricComparison, QuestionDiff};
pub use harness::{
    approach_name, run_strategy, EvaluationContext, QuestionOutcome, SkippedQuestion, StrategyRun,
};
pub use metrics::{aggregate, delta_pct, score, Aggregate, MetricSummary, ScoreRecord, Scores};
pub use report::{format_delta, render_console_table, render_markdown, render_run_summary};
