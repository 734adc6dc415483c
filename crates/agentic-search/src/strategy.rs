//! The agentic tool as a [`RetrievalStrategy`]

use crate::citations::CitationExtractor;
use crate::client::AgenticQueryClient;
use crate::prompts::file_citation_prompt;
use async_trait::async_trait;
use codeeval_core::error::Result;
use codeeval_core::{
    PathResolver, Question, RetrievalResult, RetrievalStrategy, Strategy, TokenCounter,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Asks the external tool each question and scores the files it cites
///
/// Token usage is the token count of the tool's full response, hallucinated
/// citations included.
pub struct AgenticStrategy {
    client: Arc<dyn AgenticQueryClient>,
    extractor: CitationExtractor,
    resolver: Arc<dyn PathResolver>,
    token_counter: Arc<dyn TokenCounter>,
    max_files: usize,
    excluded_prefixes: Vec<String>,
}

impl AgenticStrategy {
    pub fn new(
        client: Arc<dyn AgenticQueryClient>,
        resolver: Arc<dyn PathResolver>,
        token_counter: Arc<dyn TokenCounter>,
        max_files: usize,
        excluded_prefixes: Vec<String>,
    ) -> Self {
        let extractor =
            CitationExtractor::default().with_excluded_prefixes(excluded_prefixes.clone());
        Self {
            client,
            extractor,
            resolver,
            token_counter,
            max_files,
            excluded_prefixes,
        }
    }

    /// Replace the default extractor, e.g. to strip an absolute codebase root
    pub fn with_extractor(mut self, extractor: CitationExtractor) -> Self {
        self.extractor = extractor.with_excluded_prefixes(self.excluded_prefixes.clone());
        self
    }
}

#[async_trait]
impl RetrievalStrategy for AgenticStrategy {
    fn strategy(&self) -> Strategy {
        Strategy::Agentic
    }

    fn max_files(&self) -> usize {
        self.max_files
    }

    fn metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let mut metadata = BTreeMap::new();
        metadata.insert("tool".to_string(), json!(self.client.tool_name()));
        metadata.insert("max_files".to_string(), json!(self.max_files));
        metadata.insert(
            "token_counter".to_string(),
            json!(self.token_counter.name()),
        );
        metadata.insert(
            "excluded_prefixes".to_string(),
            json!(self.excluded_prefixes),
        );
        metadata
    }

    async fn retrieve(&self, question: &Question) -> Result<RetrievalResult> {
        let prompt = file_citation_prompt(&question.text, self.max_files, &self.excluded_prefixes);
        let response = self.client.query(&prompt).await?;

        let citations = self
            .extractor
            .extract(&response, self.resolver.as_ref(), self.max_files);

        if citations.cited.is_empty() {
            warn!(
                "Question {}: no corpus files cited ({} candidates, {} hallucinated)",
                question.id,
                citations.candidate_count,
                citations.hallucinated.len()
            );
        } else {
            debug!(
                "Question {}: {} files cited, {} hallucinated",
                question.id,
                citations.cited.len(),
                citations.hallucinated.len()
            );
        }

        let token_usage = self.token_counter.count(&response);
        Ok(RetrievalResult::new(
            question.id.clone(),
            Strategy::Agentic,
            citations.cited,
            token_usage,
        )
        .with_hallucinated(citations.hallucinated)
        .with_raw_response(response))
    }
}
