//! Markdown and console renderings of a [`ComparisonSummary`] or a single run

use crate::comparison::{ComparisonSummary, Metric, MetricComparison, QuestionDiff};
use crate::harness::StrategyRun;
use std::fmt;

const HEADLINE_METRICS: [Metric; 4] = [
    Metric::Iou,
    Metric::MeanTokenUsage,
    Metric::Precision,
    Metric::Recall,
];

/// `+12.3%`, or `n/a` when the baseline was zero
pub fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{d:+.1}%"),
        None => "n/a".to_string(),
    }
}

fn format_value(metric: Metric, value: f64) -> String {
    if metric.lower_is_better() {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}

fn agentic_wins(metric: Metric, cmp: &MetricComparison) -> bool {
    if metric.lower_is_better() {
        cmp.agentic < cmp.rag
    } else {
        cmp.agentic > cmp.rag
    }
}

/// Fixed-width comparison table for the terminal
pub fn render_console_table(summary: &ComparisonSummary) -> String {
    ConsoleTable(summary).to_string()
}

struct ConsoleTable<'a>(&'a ComparisonSummary);

impl fmt::Display for ConsoleTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        writeln!(f, "\n{:=<70}", "")?;
        writeln!(f, "COMPARISON SUMMARY")?;
        writeln!(f, "{:=<70}", "")?;
        writeln!(f, "{:<20} {:>15} {:>15} {:>15}", "Metric", "RAG", "Agentic", "Delta")?;
        writeln!(f, "{:-<70}", "")?;
        for metric in HEADLINE_METRICS {
            if let Some(cmp) = summary.overall(metric) {
                writeln!(
                    f,
                    "{:<20} {:>15} {:>15} {:>15}",
                    metric.label(),
                    format_value(metric, cmp.rag),
                    format_value(metric, cmp.agentic),
                    format_delta(cmp.delta_pct)
                )?;
            }
        }
        writeln!(f, "{:-<70}", "")?;
        writeln!(
            f,
            "Questions compared: {} of {} (skipped: RAG {}, Agentic {})",
            summary.experiment.compared_questions,
            summary.experiment.total_questions,
            summary.skipped.rag.len(),
            summary.skipped.agentic.len()
        )?;
        writeln!(f, "{:=<70}", "")
    }
}

/// Aggregate metrics of one run, printed after `rag` and `agentic` evaluations
pub fn render_run_summary(run: &StrategyRun) -> String {
    RunSummary(run).to_string()
}

struct RunSummary<'a>(&'a StrategyRun);

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let run = self.0;
        let m = &run.aggregate.overall;
        writeln!(f, "\n{:=<70}", "")?;
        writeln!(f, "{} RESULTS (n={})", run.approach.to_uppercase(), m.count)?;
        writeln!(f, "{:=<70}", "")?;
        writeln!(f, "  Average IoU:       {:.3}", m.iou)?;
        writeln!(f, "  Average Precision: {:.3}", m.precision)?;
        writeln!(f, "  Average Recall:    {:.3}", m.recall)?;
        writeln!(f, "  Average Tokens:    {:.0}", m.mean_token_usage)?;
        writeln!(f, "  Total Tokens:      {}", m.total_token_usage)?;
        writeln!(f, "  Macro IoU:         {:.3}", run.aggregate.macro_mean.iou)?;

        if !run.aggregate.by_category.is_empty() {
            writeln!(f, "\n  {:<14} {:>6} {:>8} {:>10}", "Category", "n", "IoU", "Tokens")?;
            for (category, s) in &run.aggregate.by_category {
                writeln!(
                    f,
                    "  {:<14} {:>6} {:>8.3} {:>10.0}",
                    category.label(),
                    s.count,
                    s.iou,
                    s.mean_token_usage
                )?;
            }
        }

        if !run.skipped.is_empty() {
            writeln!(f, "\nSkipped questions ({}):", run.skipped.len())?;
            for skipped in &run.skipped {
                writeln!(f, "  - {}: {}", skipped.question_id, skipped.reason)?;
            }
        }
        Ok(())
    }
}

/// Full Markdown report
pub fn render_markdown(summary: &ComparisonSummary) -> String {
    MarkdownReport(summary).to_string()
}

struct MarkdownReport<'a>(&'a ComparisonSummary);

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.0;
        let exp = &summary.experiment;

        writeln!(f, "# RAG vs Agentic Search: Experimental Results\n")?;

        writeln!(f, "## Experiment Configuration\n")?;
        writeln!(f, "- **Total Questions**: {}", exp.total_questions)?;
        writeln!(f, "- **Questions Compared**: {}", exp.compared_questions)?;
        writeln!(f, "- **RAG Approach**: {}", exp.rag_approach)?;
        for (key, value) in &exp.rag_metadata {
            writeln!(f, "  - {key}: {}", display_json(value))?;
        }
        writeln!(f, "- **Top-K Retrieval**: {}", exp.rag_max_files)?;
        writeln!(f, "- **Agentic Approach**: {}", exp.agentic_approach)?;
        for (key, value) in &exp.agentic_metadata {
            writeln!(f, "  - {key}: {}", display_json(value))?;
        }
        writeln!(f, "- **Max Cited Files**: {}\n", exp.agentic_max_files)?;

        writeln!(f, "## Overall Performance Comparison\n")?;
        writeln!(f, "| Metric | RAG | Agentic Search | Delta |")?;
        writeln!(f, "|--------|-----|----------------|-------|")?;
        for metric in HEADLINE_METRICS.into_iter().chain([Metric::TotalTokenUsage]) {
            if let Some(cmp) = summary.overall(metric) {
                writeln!(f, "{}", table_row(metric, cmp, true))?;
            }
        }
        writeln!(f)?;

        if !summary.macro_mean.is_empty() {
            writeln!(f, "Macro averages (mean of category means):\n")?;
            writeln!(f, "| Metric | RAG | Agentic Search | Delta |")?;
            writeln!(f, "|--------|-----|----------------|-------|")?;
            for (metric, cmp) in &summary.macro_mean {
                writeln!(f, "{}", table_row(*metric, cmp, false))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "## Key Findings\n")?;
        for (i, metric) in HEADLINE_METRICS.into_iter().enumerate() {
            if let Some(cmp) = summary.overall(metric) {
                writeln!(f, "### {}. {}", i + 1, metric.label())?;
                writeln!(f, "- **RAG**: {}", format_value(metric, cmp.rag))?;
                writeln!(f, "- **Agentic Search**: {}", format_value(metric, cmp.agentic))?;
                writeln!(f, "- **Result**: {}\n", finding(metric, cmp))?;
            }
        }

        writeln!(f, "## Performance by Question Type\n")?;
        for (category, comparison) in &summary.by_category {
            writeln!(
                f,
                "### {} Questions ({} questions)\n",
                category.label(),
                comparison.count
            )?;
            writeln!(f, "| Metric | RAG | Agentic Search | Delta |")?;
            writeln!(f, "|--------|-----|----------------|-------|")?;
            for metric in HEADLINE_METRICS {
                if let Some(cmp) = comparison.metrics.get(&metric) {
                    writeln!(f, "{}", table_row(metric, cmp, false))?;
                }
            }
            writeln!(f)?;
        }

        writeln!(f, "## Detailed Results\n")?;
        writeln!(f, "### Top 5 Best Performing Questions (Agentic Search)\n")?;
        for diff in summary.top_improvements(5) {
            write_diff(f, diff, "Improvement")?;
        }
        writeln!(f, "### Top 5 Worst Performing Questions (Agentic Search)\n")?;
        for diff in summary.top_regressions(5) {
            write_diff(f, diff, "Difference")?;
        }

        writeln!(f, "## Skipped Questions\n")?;
        writeln!(f, "Skipped questions are excluded from every average above.\n")?;
        writeln!(f, "- **RAG**: {}", skipped_list(&summary.skipped.rag))?;
        writeln!(
            f,
            "- **Agentic Search**: {}\n",
            skipped_list(&summary.skipped.agentic)
        )?;

        writeln!(f, "## Conclusion\n")?;
        writeln!(
            f,
            "Based on {} questions scored by both approaches:\n",
            exp.compared_questions
        )?;
        writeln!(f, "{}", conclusion(summary))
    }
}

fn table_row(metric: Metric, cmp: &MetricComparison, bold: bool) -> String {
    let label = if bold {
        format!("**{}**", metric.label())
    } else {
        metric.label().to_string()
    };
    format!(
        "| {label} | {} | {} | {} |",
        format_value(metric, cmp.rag),
        format_value(metric, cmp.agentic),
        format_delta(cmp.delta_pct)
    )
}

fn finding(metric: Metric, cmp: &MetricComparison) -> String {
    if cmp.agentic == cmp.rag {
        return "Both approaches perform the same".to_string();
    }
    let winner = if agentic_wins(metric, cmp) {
        "Agentic search"
    } else {
        "RAG"
    };
    let change = match cmp.delta_pct {
        Some(d) => format!(" ({})", format_delta(Some(d))),
        None => String::new(),
    };
    if metric.lower_is_better() {
        format!("{winner} uses fewer tokens{change}")
    } else {
        format!("{winner} scores higher{change}")
    }
}

fn write_diff(f: &mut fmt::Formatter<'_>, diff: &QuestionDiff, label: &str) -> fmt::Result {
    writeln!(f, "**{}**: {}", diff.question_id, diff.question)?;
    writeln!(f, "- RAG IoU: {:.3}", diff.rag_iou)?;
    writeln!(f, "- Agentic IoU: {:.3}", diff.agentic_iou)?;
    writeln!(f, "- {label}: {:+.3}\n", diff.iou_diff)
}

fn skipped_list(ids: &[String]) -> String {
    if ids.is_empty() {
        "none".to_string()
    } else {
        format!("{} ({})", ids.len(), ids.join(", "))
    }
}

fn display_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn conclusion(summary: &ComparisonSummary) -> String {
    let (Some(iou), Some(tokens)) = (
        summary.overall(Metric::Iou),
        summary.overall(Metric::MeanTokenUsage),
    ) else {
        return "No metrics were available to compare.".to_string();
    };

    let iou_delta = format_delta(iou.delta_pct);
    let token_delta = format_delta(tokens.delta_pct);
    let better_accuracy = iou.agentic > iou.rag;
    let fewer_tokens = tokens.agentic < tokens.rag;

    match (better_accuracy, fewer_tokens) {
        (true, true) => format!(
            "**Agentic search outperforms RAG on both accuracy and efficiency:**\n\
             - IoU change: {iou_delta}\n\
             - Token usage change: {token_delta}"
        ),
        (true, false) => format!(
            "**Agentic search is more accurate but uses more tokens:**\n\
             - IoU change: {iou_delta}\n\
             - Token usage change: {token_delta}"
        ),
        (false, true) => format!(
            "**RAG is at least as accurate while agentic search uses fewer tokens:**\n\
             - IoU change: {iou_delta}\n\
             - Token usage change: {token_delta}"
        ),
        (false, false) => format!(
            "**RAG matches or outperforms agentic search on both accuracy and efficiency:**\n\
             - IoU change: {iou_delta}\n\
             - Token usage change: {token_delta}"
        ),
    }
}
