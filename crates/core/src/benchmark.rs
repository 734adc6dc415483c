//! Benchmark questions with expert-labelled ground truth
//!
//! The benchmark file is a JSON document of the form
//!
//! ```json
//! {
//!   "questions": [
//!     {
//!       "id": "q1",
//!       "type": "direct",
//!       "question": "Where is OAuth2 implemented?",
//!       "ground_truth": ["packages/core/src/code_assist/oauth2.ts"]
//!     }
//!   ]
//! }
//! ```
//!
//! `category` and `text` are accepted as aliases for `type` and `question`.

use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::info;

/// Kind of question, used to group aggregate metrics
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
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestionCategory {
    /// "Where is X implemented?"
    Direct,
    /// Questions about what depends on what
    Dependency,
    /// Questions spanning a feature across several files
    Feature,
    /// "What would need to change to ..."
    Refactoring,
}

impl QuestionCategory {
    /// Human-readable label, e.g. `Direct`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "Direct",
            Self::Dependency => "Dependency",
            Self::Feature => "Feature",
            Self::Refactoring => "Refactoring",
        }
    }
}

/// A single benchmark question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub category: QuestionCategory,
    #[serde(rename = "question")]
    pub text: String,
    /// Repository-relative paths, never empty
    pub ground_truth: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: String,
    #[serde(rename = "type", alias = "category")]
    category: QuestionCategory,
    #[serde(rename = "question", alias = "text")]
    text: String,
    ground_truth: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBenchmark {
    questions: Vec<RawQuestion>,
}

impl Question {
    /// Build a question, enforcing a non-empty, duplicate-free ground truth
    pub fn new(
        id: impl Into<String>,
        category: QuestionCategory,
        text: impl Into<String>,
        ground_truth: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let id = id.into();
        let paths: Vec<String> = ground_truth
            .into_iter()
            .map(|p| normalize_ground_truth_path(&p.into()))
            .collect();

        if id.trim().is_empty() {
            return Err(Error::benchmark("question id cannot be empty"));
        }
        if paths.is_empty() {
            return Err(Error::benchmark(format!(
                "question '{id}' has an empty ground truth"
            )));
        }

        let mut set = BTreeSet::new();
        for path in paths {
            if path.is_empty() {
                return Err(Error::benchmark(format!(
                    "question '{id}' has an empty ground truth path"
                )));
            }
            if !set.insert(path.clone()) {
                return Err(Error::benchmark(format!(
                    "question '{id}' lists ground truth path '{path}' more than once"
                )));
            }
        }

        Ok(Self {
            id,
            category,
            text: text.into(),
            ground_truth: set,
        })
    }
}

fn normalize_ground_truth_path(path: &str) -> String {
    let path = path.trim().replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

/// Ordered, read-only question set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Benchmark {
    questions: Vec<Question>,
}

impl Benchmark {
    /// Build a benchmark, rejecting duplicate question ids
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(Error::benchmark("benchmark contains no questions"));
        }
        let mut seen = HashSet::new();
        for question in &questions {
            if !seen.insert(question.id.as_str()) {
                return Err(Error::benchmark(format!(
                    "duplicate question id '{}'",
                    question.id
                )));
            }
        }
        Ok(Self { questions })
    }

    /// Parse a benchmark from its JSON representation
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawBenchmark = serde_json::from_str(content)
            .map_err(|e| Error::benchmark(format!("Failed to parse benchmark JSON: {e}")))?;

        let questions = raw
            .questions
            .into_iter()
            .map(|q| Question::new(q.id, q.category, q.text, q.ground_truth))
            .collect::<Result<Vec<_>>>()?;

        Self::new(questions)
    }

    /// Load a benchmark file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read benchmark file {}", path.display()))?;
        let benchmark = Self::from_json(&content)?;
        info!(
            "Loaded {} questions from {}",
            benchmark.len(),
            path.display()
        );
        Ok(benchmark)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Question ids in benchmark order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.questions.iter().map(|q| q.id.as_str())
    }
}
