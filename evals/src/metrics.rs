//! Retrieval quality metrics
//!
//! Each question is scored by comparing the set of retrieved paths with the
//! ground-truth set:
//! - **Precision**: `|R ∩ G| / |R|`, 0 when nothing was retrieved
//! - **Recall**: `|R ∩ G| / |G|`
//! - **IoU**: `|R ∩ G| / |R ∪ G|`, 0 when both sets are empty
//!
//! Token usage is aggregated separately and never mixed with the 0-1 metrics.

use codeeval_core::{Question, QuestionCategory, RetrievalResult, Strategy};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// The three set-overlap metrics for one question
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub iou: f64,
}

/// Score one retrieved sequence against a ground-truth set
///
/// Retrieved order and duplicates are ignored.
pub fn score<S: AsRef<str>>(retrieved: &[S], ground_truth: &BTreeSet<String>) -> Scores {
    let retrieved: HashSet<&str> = retrieved.iter().map(|p| p.as_ref()).collect();
    let intersection = retrieved
        .iter()
        .filter(|path| ground_truth.contains(**path))
        .count();
    let union = retrieved.len() + ground_truth.len() - intersection;

    Scores {
        precision: ratio(intersection, retrieved.len()),
        recall: ratio(intersection, ground_truth.len()),
        iou: ratio(intersection, union),
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Percentage change from `a` to `b`; `None` when `a` is zero
pub fn delta_pct(a: f64, b: f64) -> Option<f64> {
    if a == 0.0 {
        None
    } else {
        Some((b - a) / a * 100.0)
    }
}

/// Scores of one (question, strategy) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub question_id: String,
    pub category: QuestionCategory,
    pub strategy: Strategy,
    pub precision: f64,
    pub recall: f64,
    pub iou: f64,
    pub token_usage: usize,
    pub retrieved_count: usize,
}

impl ScoreRecord {
    pub fn new(question: &Question, result: &RetrievalResult) -> Self {
        let scores = score(&result.retrieved, &question.ground_truth);
        Self {
            question_id: question.id.clone(),
            category: question.category,
            strategy: result.strategy,
            precision: scores.precision,
            recall: scores.recall,
            iou: scores.iou,
            token_usage: result.token_usage,
            retrieved_count: result.retrieved.len(),
        }
    }

    pub fn scores(&self) -> Scores {
        Scores {
            precision: self.precision,
            recall: self.recall,
            iou: self.iou,
        }
    }
}

/// Means over a group of score records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub count: usize,
    pub precision: f64,
    pub recall: f64,
    pub iou: f64,
    pub total_token_usage: usize,
    pub mean_token_usage: f64,
}

impl MetricSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ScoreRecord>) -> Self {
        let mut summary = Self::default();
        let (mut precision, mut recall, mut iou) = (0.0, 0.0, 0.0);

        for record in records {
            summary.count += 1;
            precision += record.precision;
            recall += record.recall;
            iou += record.iou;
            summary.total_token_usage += record.token_usage;
        }

        if summary.count > 0 {
            let n = summary.count as f64;
            summary.precision = precision / n;
            summary.recall = recall / n;
            summary.iou = iou / n;
            summary.mean_token_usage = summary.total_token_usage as f64 / n;
        }
        summary
    }

    pub fn scores(&self) -> Scores {
        Scores {
            precision: self.precision,
            recall: self.recall,
            iou: self.iou,
        }
    }
}

/// Overall, per-category and macro-averaged metrics of one strategy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Per-question (weighted) means
    pub overall: MetricSummary,
    pub by_category: BTreeMap<QuestionCategory, MetricSummary>,
    /// Unweighted mean of the category means
    pub macro_mean: Scores,
}

/// Aggregate a set of score records
pub fn aggregate(records: &[ScoreRecord]) -> Aggregate {
    let mut grouped: BTreeMap<QuestionCategory, Vec<&ScoreRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.category).or_default().push(record);
    }

    let by_category: BTreeMap<QuestionCategory, MetricSummary> = grouped
        .into_iter()
        .map(|(category, group)| (category, MetricSummary::from_records(group)))
        .collect();

    let macro_mean = if by_category.is_empty() {
        Scores::default()
    } else {
        let n = by_category.len() as f64;
        Scores {
            precision: by_category.values().map(|s| s.precision).sum::<f64>() / n,
            recall: by_category.values().map(|s| s.recall).sum::<f64>() / n,
            iou: by_category.values().map(|s| s.iou).sum::<f64>() / n,
        }
    };

    Aggregate {
        overall: MetricSummary::from_records(records),
        by_category,
        macro_mean,
    }
}
