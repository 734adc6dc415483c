//! Both strategies end to end: corpus -> index -> evaluate -> compare -> report
//!
//! Runs entirely in process with the mock embedding provider, the in-memory
//! vector index and a scripted agentic tool.

use async_trait::async_trait;
use codeeval_agentic_search::{AgenticQueryClient, AgenticStrategy, Result as AgenticResult};
use codeeval_core::config::{CorpusConfig, EmbeddingsConfig, EvaluationConfig};
use codeeval_core::{load_corpus, ApproximateTokenCounter, Benchmark, Corpus, Error, Strategy};
use codeeval_embeddings::{EmbeddingManager, MockEmbeddingProvider, NoRetry};
use codeeval_evals::{compare, render_markdown, run_strategy, EvaluationContext, Metric};
use codeeval_indexer::{EmbeddingIndexer, RagStrategy, SimilarityRetriever};
use codeeval_storage::InMemoryVectorIndex;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const BENCHMARK: &str = r#"{
    "questions": [
        {"id": "q1", "type": "direct",
         "question": "Where is the oauth2 login token refresh implemented?",
         "ground_truth": ["packages/core/src/code_assist/oauth2.ts"]},
        {"id": "q2", "type": "feature",
         "question": "Which files implement the dark theme palette colors?",
         "ground_truth": ["packages/cli/src/ui/theme.ts", "packages/cli/src/ui/colors.ts"]},
        {"id": "q3", "type": "dependency",
         "question": "What depends on the tool registry?",
         "ground_truth": [
             "packages/core/src/tools/registry.ts",
             "packages/core/src/config/config.ts"
         ]}
    ]
}"#;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}

fn codebase() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "packages/core/src/code_assist/oauth2.ts", "oauth2 login token refresh client");
    write(root, "packages/core/src/config/config.ts", "config loader uses tool registry");
    write(root, "packages/core/src/tools/registry.ts", "tool registry register discover");
    write(root, "packages/cli/src/ui/theme.ts", "dark theme palette");
    write(root, "packages/cli/src/ui/colors.ts", "palette colors dark light");
    write(root, "node_modules/left-pad/index.js", "module.exports = leftPad");
    write(root, ".brv/context-tree/auth.md", "oauth2 notes");
    dir
}

struct ScriptedTool;

#[async_trait]
impl AgenticQueryClient for ScriptedTool {
    async fn query(&self, prompt: &str) -> AgenticResult<String> {
        let answer = if prompt.contains("token refresh") {
            "FILE: packages/core/src/code_assist/oauth2.ts\nFILE: .brv/context-tree/auth.md"
        } else if prompt.contains("dark theme") {
            "The theme lives in `packages/cli/src/ui/theme.ts` and packages/cli/src/ui/colors.ts."
        } else {
            "FILE: packages/core/src/tools/registry.ts\n\
             FILE: packages/core/src/tools/registry_v2.ts"
        };
        Ok(answer.to_string())
    }

    fn tool_name(&self) -> String {
        "scripted brv".to_string()
    }
}

async fn rag_strategy(corpus: &Corpus) -> RagStrategy {
    let embeddings_config = EmbeddingsConfig {
        provider: "mock".to_string(),
        embedding_dimension: 256,
        texts_per_api_request: 2,
        ..EmbeddingsConfig::default()
    };
    let embeddings = Arc::new(EmbeddingManager::new(
        Arc::new(MockEmbeddingProvider::new(256)),
        Arc::new(NoRetry),
    ));
    let index = Arc::new(InMemoryVectorIndex::new("pipeline"));
    let handle = EmbeddingIndexer::new(embeddings.clone(), index, &embeddings_config)
        .index(corpus.entries())
        .await
        .unwrap();
    RagStrategy::new(SimilarityRetriever::new(handle, embeddings), 2, "mock-bag-of-words")
}

#[tokio::test]
async fn test_full_comparison() {
    let dir = codebase();
    let corpus = Arc::new(
        load_corpus(dir.path(), &CorpusConfig::default(), &ApproximateTokenCounter).unwrap(),
    );
    assert_eq!(corpus.len(), 5);

    let benchmark = Arc::new(Benchmark::from_json(BENCHMARK).unwrap());
    let context = EvaluationContext::new(benchmark, &EvaluationConfig::default());

    let rag = run_strategy(&context, &rag_strategy(&corpus).await).await.unwrap();
    assert_eq!(rag.strategy, Strategy::Rag);
    assert_eq!(rag.results.len(), 3);
    assert!(rag.results.iter().all(|r| r.result.retrieved.len() <= 2));
    assert_eq!(
        rag.results[0].result.retrieved[0],
        "packages/core/src/code_assist/oauth2.ts"
    );

    let agentic_strategy = AgenticStrategy::new(
        Arc::new(ScriptedTool),
        corpus.clone(),
        Arc::new(ApproximateTokenCounter),
        10,
        vec![".brv/".to_string()],
    );
    let agentic = run_strategy(&context, &agentic_strategy).await.unwrap();
    assert_eq!(agentic.results[0].metrics.iou, 1.0);
    assert_eq!(agentic.results[1].metrics.iou, 1.0);
    assert_eq!(
        agentic.results[2].result.hallucinated,
        vec!["packages/core/src/tools/registry_v2.ts".to_string()]
    );
    assert_eq!(agentic.results[2].metrics.iou, 0.5);

    let summary = compare(&rag, &agentic).unwrap();
    assert_eq!(summary.experiment.compared_questions, 3);
    let iou = summary.overall(Metric::Iou).unwrap();
    assert!((iou.agentic - 2.5 / 3.0).abs() < 1e-9);

    let dir_out = tempfile::tempdir().unwrap();
    let json_path = dir_out.path().join("comparison_summary.json");
    summary.save(&json_path).unwrap();
    assert!(json_path.exists());

    let markdown = render_markdown(&summary);
    assert!(markdown.contains("### Dependency Questions (1 questions)"));
    assert!(markdown.contains("scripted brv"));
}

#[tokio::test]
async fn test_comparing_different_benchmarks_fails() {
    let dir = codebase();
    let corpus = Arc::new(
        load_corpus(dir.path(), &CorpusConfig::default(), &ApproximateTokenCounter).unwrap(),
    );
    let full = Arc::new(Benchmark::from_json(BENCHMARK).unwrap());
    let partial = Arc::new(Benchmark::new(full.questions()[..2].to_vec()).unwrap());

    let strategy = rag_strategy(&corpus).await;
    let a = run_strategy(
        &EvaluationContext::new(full, &EvaluationConfig::default()),
        &strategy,
    )
    .await
    .unwrap();
    let b = run_strategy(
        &EvaluationContext::new(partial, &EvaluationConfig::default()),
        &strategy,
    )
    .await
    .unwrap();

    match compare(&a, &b) {
        Err(Error::Alignment {
            missing_from_second,
            ..
        }) => assert_eq!(missing_from_second, vec!["q3".to_string()]),
        other => panic!("expected alignment error, got {other:?}"),
    }
}
