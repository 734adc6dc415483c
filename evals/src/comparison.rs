//! Joins a RAG run and an agentic run into one comparison summary
//!
//! Both runs must cover the same question ids (scored or skipped), each id
//! exactly once, and must come from the expected strategies. Metrics
//! are compared over the questions scored by both runs, so a question one
//! strategy failed on never biases the other's average.

use crate::harness::StrategyRun;
use crate::metrics::{aggregate, delta_pct, Aggregate, MetricSummary, ScoreRecord};
use codeeval_core::error::{Error, Result};
use codeeval_core::{QuestionCategory, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use strum_macros::{AsRefStr, Display, EnumIter};
use tracing::{info, warn};

/// Metrics reported in a comparison
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    Iou,
    Precision,
    Recall,
    MeanTokenUsage,
    TotalTokenUsage,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Iou => "IoU Score",
            Self::Precision => "Precision",
            Self::Recall => "Recall",
            Self::MeanTokenUsage => "Token Usage",
            Self::TotalTokenUsage => "Total Tokens",
        }
    }

    /// Token metrics improve downwards
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Self::MeanTokenUsage | Self::TotalTokenUsage)
    }

    fn of(&self, summary: &MetricSummary) -> f64 {
        match self {
            Self::Iou => summary.iou,
            Self::Precision => summary.precision,
            Self::Recall => summary.recall,
            Self::MeanTokenUsage => summary.mean_token_usage,
            Self::TotalTokenUsage => summary.total_token_usage as f64,
        }
    }
}

/// One metric for both strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub rag: f64,
    pub agentic: f64,
    /// `(agentic - rag) / rag * 100`, null when the RAG value is zero
    pub delta_pct: Option<f64>,
}

impl MetricComparison {
    pub fn new(rag: f64, agentic: f64) -> Self {
        Self {
            rag,
            agentic,
            delta_pct: delta_pct(rag, agentic),
        }
    }

    pub fn difference(&self) -> f64 {
        self.agentic - self.rag
    }
}

pub type MetricTable = BTreeMap<Metric, MetricComparison>;

fn metric_table(rag: &MetricSummary, agentic: &MetricSummary) -> MetricTable {
    use strum::IntoEnumIterator;
    Metric::iter()
        .map(|m| (m, MetricComparison::new(m.of(rag), m.of(agentic))))
        .collect()
}

/// Comparison of one question category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryComparison {
    pub count: usize,
    pub metrics: MetricTable,
}

/// IoU of both strategies on one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDiff {
    pub question_id: String,
    #[serde(rename = "type")]
    pub category: QuestionCategory,
    pub question: String,
    pub rag_iou: f64,
    pub agentic_iou: f64,
    pub iou_diff: f64,
}

/// Failed questions per strategy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSummary {
    pub rag: Vec<String>,
    pub agentic: Vec<String>,
}

/// What was compared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentInfo {
    pub total_questions: usize,
    /// Questions scored by both strategies
    pub compared_questions: usize,
    pub rag_approach: String,
    pub agentic_approach: String,
    pub rag_max_files: usize,
    pub agentic_max_files: usize,
    pub rag_metadata: BTreeMap<String, serde_json::Value>,
    pub agentic_metadata: BTreeMap<String, serde_json::Value>,
}

/// Authoritative comparison output; the Markdown and console renderings are projections of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub experiment: ExperimentInfo,
    pub overall: MetricTable,
    /// Unweighted mean of category means, for the 0-1 metrics
    pub macro_mean: MetricTable,
    pub by_category: BTreeMap<QuestionCategory, CategoryComparison>,
    pub skipped: SkippedSummary,
    /// Sorted by `iou_diff`, largest agentic advantage first
    pub question_diffs: Vec<QuestionDiff>,
}

impl ComparisonSummary {
    /// Questions where agentic search gained most over RAG
    pub fn top_improvements(&self, n: usize) -> &[QuestionDiff] {
        &self.question_diffs[..n.min(self.question_diffs.len())]
    }

    /// Questions where agentic search lost most against RAG, worst first
    pub fn top_regressions(&self, n: usize) -> Vec<&QuestionDiff> {
        self.question_diffs.iter().rev().take(n).collect()
    }

    pub fn overall(&self, metric: Metric) -> Option<&MetricComparison> {
        self.overall.get(&metric)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("JSON summary saved to {}", path.display());
        Ok(())
    }
}

/// Compare two strategy runs question by question
pub fn compare(rag: &StrategyRun, agentic: &StrategyRun) -> Result<ComparisonSummary> {
    check_run(rag, Strategy::Rag)?;
    check_run(agentic, Strategy::Agentic)?;

    let rag_ids = rag.question_ids();
    let agentic_ids = agentic.question_ids();
    if rag_ids != agentic_ids {
        let missing_from_rag: Vec<String> = agentic_ids.difference(&rag_ids).cloned().collect();
        let missing_from_agentic: Vec<String> =
            rag_ids.difference(&agentic_ids).cloned().collect();
        return Err(Error::alignment(
            "RAG and agentic results cover different questions",
            missing_from_rag,
            missing_from_agentic,
        ));
    }

    let rag_scored: BTreeMap<&str, _> = rag
        .results
        .iter()
        .map(|r| (r.question_id(), r))
        .collect();
    let agentic_scored: BTreeMap<&str, _> = agentic
        .results
        .iter()
        .map(|r| (r.question_id(), r))
        .collect();

    let common: BTreeSet<&str> = rag_scored
        .keys()
        .filter(|id| agentic_scored.contains_key(*id))
        .copied()
        .collect();
    if common.len() < rag_scored.len().max(agentic_scored.len()) {
        warn!(
            "Comparing {} questions scored by both strategies out of {}",
            common.len(),
            rag_ids.len()
        );
    }

    // Keep RAG's run order so diffs with equal IoU difference stay stable
    let mut rag_records: Vec<ScoreRecord> = Vec::with_capacity(common.len());
    let mut agentic_records: Vec<ScoreRecord> = Vec::with_capacity(common.len());
    let mut question_diffs = Vec::with_capacity(common.len());
    for outcome in rag.results.iter().filter(|r| common.contains(r.question_id())) {
        let Some(other) = agentic_scored.get(outcome.question_id()) else {
            continue;
        };
        rag_records.push(outcome.score_record());
        agentic_records.push(other.score_record());
        question_diffs.push(QuestionDiff {
            question_id: outcome.question_id().to_string(),
            category: outcome.category,
            question: outcome.question.clone(),
            rag_iou: outcome.metrics.iou,
            agentic_iou: other.metrics.iou,
            iou_diff: other.metrics.iou - outcome.metrics.iou,
        });
    }
    question_diffs.sort_by(|a, b| b.iou_diff.total_cmp(&a.iou_diff));

    let rag_agg = aggregate(&rag_records);
    let agentic_agg = aggregate(&agentic_records);

    Ok(ComparisonSummary {
        experiment: ExperimentInfo {
            total_questions: rag_ids.len(),
            compared_questions: common.len(),
            rag_approach: rag.approach.clone(),
            agentic_approach: agentic.approach.clone(),
            rag_max_files: rag.max_files,
            agentic_max_files: agentic.max_files,
            rag_metadata: rag.metadata.clone(),
            agentic_metadata: agentic.metadata.clone(),
        },
        overall: metric_table(&rag_agg.overall, &agentic_agg.overall),
        macro_mean: macro_table(&rag_agg, &agentic_agg),
        by_category: category_tables(&rag_agg, &agentic_agg),
        skipped: SkippedSummary {
            rag: rag.skipped.iter().map(|s| s.question_id.clone()).collect(),
            agentic: agentic.skipped.iter().map(|s| s.question_id.clone()).collect(),
        },
        question_diffs,
    })
}

/// A run must come from `expected` and list every question once
fn check_run(run: &StrategyRun, expected: Strategy) -> Result<()> {
    if run.strategy != expected {
        return Err(Error::alignment(
            format!(
                "expected {} results but got {} results ({})",
                expected.label(),
                run.strategy.label(),
                run.approach
            ),
            Vec::new(),
            Vec::new(),
        ));
    }

    let duplicates = run.duplicate_question_ids();
    if !duplicates.is_empty() {
        return Err(Error::alignment(
            format!(
                "{} results list questions more than once: {}",
                expected.label(),
                duplicates.join(", ")
            ),
            Vec::new(),
            Vec::new(),
        ));
    }
    Ok(())
}

fn macro_table(rag: &Aggregate, agentic: &Aggregate) -> MetricTable {
    [
        (Metric::Iou, rag.macro_mean.iou, agentic.macro_mean.iou),
        (
            Metric::Precision,
            rag.macro_mean.precision,
            agentic.macro_mean.precision,
        ),
        (Metric::Recall, rag.macro_mean.recall, agentic.macro_mean.recall),
    ]
    .into_iter()
    .map(|(metric, r, a)| (metric, MetricComparison::new(r, a)))
    .collect()
}

fn category_tables(
    rag: &Aggregate,
    agentic: &Aggregate,
) -> BTreeMap<QuestionCategory, CategoryComparison> {
    rag.by_category
        .iter()
        .filter_map(|(category, rag_summary)| {
            let agentic_summary = agentic.by_category.get(category)?;
            Some((
                *category,
                CategoryComparison {
                    count: rag_summary.count,
                    metrics: metric_table(rag_summary, agentic_summary),
                },
            ))
        })
        .collect()
}
