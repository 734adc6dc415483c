//! Retrieval strategy interface
//!
//! A strategy answers one benchmark question with an ordered list of file
//! paths and the token cost of producing them. Implementations live in the
//! indexer (similarity search) and agentic-search crates.

use crate::benchmark::Question;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{AsRefStr, Display, EnumString};

/// Which retrieval approach produced a result
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Strategy {
    Rag,
    Agentic,
}

impl Strategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rag => "RAG",
            Self::Agentic => "Agentic",
        }
    }
}

/// The answer a strategy gave to one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub question_id: String,
    pub strategy: Strategy,
    /// Order matters only for truncation
    pub retrieved: Vec<String>,
    pub token_usage: usize,
    /// Cited paths that do not exist in the corpus
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hallucinated: Vec<String>,
    /// Retrieval scores aligned with `retrieved`, when the strategy ranks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<f32>,
    /// Free-text response the paths were extracted from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl RetrievalResult {
    pub fn new(
        question_id: impl Into<String>,
        strategy: Strategy,
        retrieved: Vec<String>,
        token_usage: usize,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            strategy,
            retrieved,
            token_usage,
            hallucinated: Vec::new(),
            scores: Vec::new(),
            raw_response: None,
        }
    }

    pub fn with_hallucinated(mut self, hallucinated: Vec<String>) -> Self {
        self.hallucinated = hallucinated;
        self
    }

    pub fn with_scores(mut self, scores: Vec<f32>) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    /// Keep at most `max` paths, in order
    pub fn truncate(&mut self, max: usize) {
        self.retrieved.truncate(max);
        self.scores.truncate(max);
    }
}

/// A retrieval approach under evaluation
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Upper bound on `retrieved.len()` for every result
    fn max_files(&self) -> usize;

    /// Model, tool and parameter details recorded with the run
    fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }

    async fn retrieve(&self, question: &Question) -> Result<RetrievalResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_strategy_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Strategy::Agentic).expect("serialize"),
            "\"agentic\""
        );
        assert_eq!(Strategy::from_str("rag").ok(), Some(Strategy::Rag));
        assert_eq!(Strategy::Rag.label(), "RAG");
    }

    #[test]
    fn test_truncate_keeps_scores_aligned() {
        let mut result = RetrievalResult::new(
            "q1",
            Strategy::Rag,
            vec!["a.ts".into(), "b.ts".into(), "c.ts".into()],
            30,
        )
        .with_scores(vec![0.9, 0.8, 0.7]);
        result.truncate(2);
        assert_eq!(result.retrieved, vec!["a.ts", "b.ts"]);
        assert_eq!(result.scores, vec![0.9, 0.8]);
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let result = RetrievalResult::new("q1", Strategy::Rag, vec![], 0);
        let json = serde_json::to_value(&result).expect("serialize");
        assert!(json.get("hallucinated").is_none());
        assert!(json.get("raw_response").is_none());

        let back: RetrievalResult = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, result);
    }
}
