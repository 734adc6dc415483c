//! Runs a retrieval strategy over a benchmark
//!
//! Questions are independent: they run with bounded concurrency, each under
//! its own timeout, and their outcomes are re-ordered to benchmark order once
//! all have completed. A question whose retrieval fails is recorded as
//! skipped and left out of the aggregate.

use crate::metrics::{aggregate, score, Aggregate, ScoreRecord, Scores};
use codeeval_core::config::EvaluationConfig;
use codeeval_core::error::{Error, Result, ResultExt};
use codeeval_core::{
    Benchmark, Question, QuestionCategory, RetrievalResult, RetrievalStrategy, Strategy,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Explicit state shared by every question of a run
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    benchmark: Arc<Benchmark>,
    max_concurrent: usize,
    question_timeout: Duration,
}

impl EvaluationContext {
    pub fn new(benchmark: Arc<Benchmark>, config: &EvaluationConfig) -> Self {
        Self {
            benchmark,
            max_concurrent: config.max_concurrent_questions.max(1),
            question_timeout: Duration::from_secs(config.question_timeout_secs),
        }
    }

    pub fn with_question_timeout(mut self, timeout: Duration) -> Self {
        self.question_timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn benchmark(&self) -> &Benchmark {
        &self.benchmark
    }

    pub fn question_timeout(&self) -> Duration {
        self.question_timeout
    }
}

/// One scored question of a run, with everything needed to audit it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    #[serde(flatten)]
    pub result: RetrievalResult,
    #[serde(rename = "type")]
    pub category: QuestionCategory,
    pub question: String,
    pub ground_truth: BTreeSet<String>,
    pub metrics: Scores,
}

impl QuestionOutcome {
    pub fn new(question: &Question, result: RetrievalResult) -> Self {
        let metrics = score(&result.retrieved, &question.ground_truth);
        Self {
            result,
            category: question.category,
            question: question.text.clone(),
            ground_truth: question.ground_truth.clone(),
            metrics,
        }
    }

    pub fn question_id(&self) -> &str {
        &self.result.question_id
    }

    pub fn score_record(&self) -> ScoreRecord {
        ScoreRecord {
            question_id: self.result.question_id.clone(),
            category: self.category,
            strategy: self.result.strategy,
            precision: self.metrics.precision,
            recall: self.metrics.recall,
            iou: self.metrics.iou,
            token_usage: self.result.token_usage,
            retrieved_count: self.result.retrieved.len(),
        }
    }
}

/// A question that could not be scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedQuestion {
    pub question_id: String,
    #[serde(rename = "type")]
    pub category: QuestionCategory,
    pub reason: String,
}

/// Persisted result of evaluating one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub approach: String,
    pub strategy: Strategy,
    pub max_files: usize,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub aggregate: Aggregate,
    pub results: Vec<QuestionOutcome>,
    #[serde(default)]
    pub skipped: Vec<SkippedQuestion>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl StrategyRun {
    pub fn score_records(&self) -> Vec<ScoreRecord> {
        self.results.iter().map(QuestionOutcome::score_record).collect()
    }

    /// Every question id the run saw, scored or skipped
    pub fn question_ids(&self) -> BTreeSet<String> {
        self.results
            .iter()
            .map(|r| r.question_id().to_string())
            .chain(self.skipped.iter().map(|s| s.question_id.clone()))
            .collect()
    }

    /// Ids that appear more than once across scored and skipped questions
    pub fn duplicate_question_ids(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<&str> = self
            .results
            .iter()
            .map(QuestionOutcome::question_id)
            .chain(self.skipped.iter().map(|s| s.question_id.as_str()))
            .filter(|id| !seen.insert(*id))
            .collect();
        duplicates.into_iter().map(str::to_string).collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read results file {}", path.display()))?;
        serde_json::from_str(&content)
            .context(format!("Failed to parse results file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .context(format!("Failed to write results file {}", path.display()))?;
        info!("Results saved to {}", path.display());
        Ok(())
    }
}

/// Display name of an approach in result files and reports
pub fn approach_name(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Rag => "RAG (Vector Similarity)",
        Strategy::Agentic => "Agentic Search",
    }
}

enum Outcome {
    Scored(QuestionOutcome),
    Skipped(SkippedQuestion),
}

/// Evaluate `strategy` on every question of the context's benchmark
///
/// Fails only when every question failed, since the aggregate would then be
/// meaningless.
pub async fn run_strategy(
    context: &EvaluationContext,
    strategy: &dyn RetrievalStrategy,
) -> Result<StrategyRun> {
    let start = Instant::now();
    let questions = context.benchmark.questions();
    let kind = strategy.strategy();

    info!(
        "Evaluating {} on {} questions ({} concurrent, {}s timeout)",
        kind.label(),
        questions.len(),
        context.max_concurrent,
        context.question_timeout.as_secs()
    );

    let mut completed: Vec<(usize, Outcome)> = stream::iter(questions.iter().enumerate())
        .map(|(position, question)| async move {
            (position, evaluate_question(context, strategy, question).await)
        })
        .buffer_unordered(context.max_concurrent)
        .collect()
        .await;
    completed.sort_by_key(|(position, _)| *position);

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for (_, outcome) in completed {
        match outcome {
            Outcome::Scored(outcome) => results.push(outcome),
            Outcome::Skipped(skip) => skipped.push(skip),
        }
    }

    if results.is_empty() && !skipped.is_empty() {
        let first = &skipped[0];
        return Err(Error::retrieval(format!(
            "All {} questions failed for {} (first failure on {}: {})",
            skipped.len(),
            kind.label(),
            first.question_id,
            first.reason
        )));
    }

    let records: Vec<ScoreRecord> = results.iter().map(QuestionOutcome::score_record).collect();
    let run = StrategyRun {
        approach: approach_name(kind).to_string(),
        strategy: kind,
        max_files: strategy.max_files(),
        metadata: strategy.metadata(),
        aggregate: aggregate(&records),
        results,
        skipped,
        elapsed_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "{} evaluation complete: {} scored, {} skipped, mean IoU {:.3} in {:.1}s",
        kind.label(),
        run.results.len(),
        run.skipped.len(),
        run.aggregate.overall.iou,
        run.elapsed_ms as f64 / 1000.0
    );
    Ok(run)
}

async fn evaluate_question(
    context: &EvaluationContext,
    strategy: &dyn RetrievalStrategy,
    question: &Question,
) -> Outcome {
    let retrieved = tokio::time::timeout(context.question_timeout, strategy.retrieve(question))
        .await
        .unwrap_or_else(|_| {
            Err(Error::timeout(
                format!("question {}", question.id),
                context.question_timeout.as_secs(),
            ))
        });

    match retrieved {
        Ok(mut result) => {
            if result.question_id != question.id {
                warn!(
                    "Strategy answered {} for question {}, relabelling",
                    result.question_id, question.id
                );
                result.question_id = question.id.clone();
            }
            result.truncate(strategy.max_files());
            Outcome::Scored(QuestionOutcome::new(question, result))
        }
        Err(e) => {
            warn!("Skipping question {}: {e}", question.id);
            Outcome::Skipped(SkippedQuestion {
                question_id: question.id.clone(),
                category: question.category,
                reason: e.to_string(),
            })
        }
    }
}
