//! Drives the `rag`, `agentic` and `compare` commands against a temporary
//! codebase with mock embeddings, the in-memory index and a shell-script tool

use codeeval::{
    run_agentic, run_compare, run_rag, AgenticArgs, CompareArgs, Config, IndexMode, RagArgs,
};
use codeeval_core::Strategy;
use codeeval_evals::StrategyRun;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BENCHMARK: &str = r#"{
    "questions": [
        {"id": "q1", "type": "direct",
         "question": "Where is the oauth2 login token refresh implemented?",
         "ground_truth": ["packages/core/src/code_assist/oauth2.ts"]},
        {"id": "q2", "type": "feature",
         "question": "Which files implement the dark theme palette?",
         "ground_truth": ["packages/cli/src/ui/theme.ts"]}
    ]
}"#;

const FAKE_TOOL: &str = r#"
for last; do :; done
case "$last" in
  *"token refresh"*) echo "FILE: packages/core/src/code_assist/oauth2.ts" ;;
  *) echo "FILE: packages/cli/src/ui/theme.ts"; echo "FILE: packages/cli/src/ui/missing.ts" ;;
esac
"#;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    std::fs::create_dir_all(full.parent().unwrap()).unwrap();
    std::fs::write(full, content).unwrap();
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("codebase");
        write(&root, "packages/core/src/code_assist/oauth2.ts", "oauth2 login token refresh");
        write(&root, "packages/core/src/tools/registry.ts", "tool registry register");
        write(&root, "packages/cli/src/ui/theme.ts", "dark theme palette colors");
        write(&root, ".brv/config.json", "{}");
        write(dir.path(), "questions.json", BENCHMARK);
        write(dir.path(), "fake-brv.sh", FAKE_TOOL);
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self) -> Config {
        // Run the script through `sh` so the file never needs the exec bit
        let toml = format!(
            r#"
[embeddings]
provider = "mock"
embedding_dimension = 256

[storage]
provider = "mock"

[rag]
top_k = 2

[agentic]
command = "sh"
args = ["{}"]
max_files = 5
timeout_secs = 10
"#,
            self.path("fake-brv.sh").display()
        );
        let config = Config::from_toml_str(&toml).unwrap();
        config.validate().unwrap();
        config
    }

    fn rag_args(&self, mode: IndexMode) -> RagArgs {
        RagArgs {
            codebase: self.path("codebase"),
            questions: self.path("questions.json"),
            output: self.path("results/rag_results.json"),
            mode,
            top_k: None,
            show_progress: false,
        }
    }

    fn agentic_args(&self) -> AgenticArgs {
        AgenticArgs {
            codebase: self.path("codebase"),
            questions: self.path("questions.json"),
            output: self.path("results/agentic_results.json"),
            max_files: None,
            timeout_secs: None,
        }
    }
}

#[tokio::test]
async fn test_rag_run_is_saved() {
    let fixture = Fixture::new();
    let run = run_rag(&fixture.config(), &fixture.rag_args(IndexMode::Full))
        .await
        .unwrap()
        .expect("full mode evaluates");

    assert_eq!(run.strategy, Strategy::Rag);
    assert_eq!(run.max_files, 2);
    assert_eq!(run.results.len(), 2);
    assert!(run.results.iter().all(|r| r.result.retrieved.len() <= 2));

    let saved = StrategyRun::load(&fixture.path("results/rag_results.json")).unwrap();
    assert_eq!(saved.question_ids(), run.question_ids());
}

#[tokio::test]
async fn test_rag_index_only_skips_evaluation() {
    let fixture = Fixture::new();
    let run = run_rag(&fixture.config(), &fixture.rag_args(IndexMode::IndexOnly))
        .await
        .unwrap();
    assert!(run.is_none());
    assert!(!fixture.path("results/rag_results.json").exists());
}

#[tokio::test]
async fn test_rag_eval_only_needs_existing_collection() {
    let fixture = Fixture::new();
    let err = run_rag(&fixture.config(), &fixture.rag_args(IndexMode::EvalOnly))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("--eval-only"));
}

#[tokio::test]
async fn test_agentic_requires_initialized_workspace() {
    let fixture = Fixture::new();
    std::fs::remove_dir_all(fixture.path("codebase/.brv")).unwrap();

    let err = run_agentic(&fixture.config(), &fixture.agentic_args())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("brv init"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_full_experiment() {
    let fixture = Fixture::new();
    let config = fixture.config();

    run_rag(&config, &fixture.rag_args(IndexMode::Full))
        .await
        .unwrap();
    let agentic = run_agentic(&config, &fixture.agentic_args()).await.unwrap();

    assert_eq!(agentic.results.len(), 2);
    let q1 = &agentic.results[0];
    assert_eq!(q1.result.retrieved, vec!["packages/core/src/code_assist/oauth2.ts"]);
    assert_eq!(q1.metrics.iou, 1.0);
    let q2 = &agentic.results[1];
    assert_eq!(q2.result.retrieved, vec!["packages/cli/src/ui/theme.ts"]);
    assert_eq!(q2.result.hallucinated, vec!["packages/cli/src/ui/missing.ts"]);

    let args = CompareArgs {
        rag_results: fixture.path("results/rag_results.json"),
        agentic_results: fixture.path("results/agentic_results.json"),
        markdown_report: fixture.path("results/comparison_report.md"),
        json_summary: fixture.path("results/comparison_summary.json"),
    };
    let (summary, table) = run_compare(&args).unwrap();

    assert_eq!(summary.experiment.compared_questions, 2);
    assert!(table.contains("COMPARISON SUMMARY"));
    let markdown = std::fs::read_to_string(&args.markdown_report).unwrap();
    assert!(markdown.starts_with("# RAG vs Agentic Search: Experimental Results"));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&args.json_summary).unwrap()).unwrap();
    assert!(json.get("overall").is_some());
}
