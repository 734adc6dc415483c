//! `codeeval rag`: index the codebase and evaluate similarity retrieval

use anyhow::{bail, Context, Result};
use codeeval_core::{default_token_counter, load_corpus, Benchmark, Config};
use codeeval_embeddings::create_embedding_manager_from_app_config;
use codeeval_evals::{run_strategy, EvaluationContext, StrategyRun};
use codeeval_indexer::{EmbeddingIndexer, IndexHandle, RagStrategy, SimilarityRetriever};
use codeeval_storage::create_vector_index;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Which half of the pipeline to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// Index, then evaluate
    Full,
    /// Index and stop
    IndexOnly,
    /// Evaluate against an existing collection
    EvalOnly,
}

impl IndexMode {
    pub fn from_flags(index_only: bool, eval_only: bool) -> Result<Self> {
        match (index_only, eval_only) {
            (false, false) => Ok(Self::Full),
            (true, false) => Ok(Self::IndexOnly),
            (false, true) => Ok(Self::EvalOnly),
            (true, true) => bail!("--index-only and --eval-only are mutually exclusive"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RagArgs {
    pub codebase: PathBuf,
    pub questions: PathBuf,
    pub output: PathBuf,
    pub mode: IndexMode,
    pub top_k: Option<usize>,
    pub show_progress: bool,
}

/// Run the RAG pipeline
///
/// Returns the evaluated run, or `None` for `--index-only`.
pub async fn run_rag(config: &Config, args: &RagArgs) -> Result<Option<StrategyRun>> {
    let top_k = args.top_k.unwrap_or(config.rag.top_k);
    if top_k == 0 {
        bail!("--top-k must be greater than 0");
    }

    // Fail on a bad benchmark before spending anything on embeddings
    let benchmark = match args.mode {
        IndexMode::IndexOnly => None,
        _ => Some(
            Benchmark::load(&args.questions)
                .with_context(|| format!("Failed to load {}", args.questions.display()))?,
        ),
    };

    let embeddings = create_embedding_manager_from_app_config(config)
        .context("Failed to create embedding manager")?;
    let collection = config.storage.resolve_collection_name(&args.codebase)?;
    let index = create_vector_index(&config.storage, collection.clone())
        .await
        .with_context(|| format!("Failed to open vector index '{collection}'"))?;

    let handle = if args.mode == IndexMode::EvalOnly {
        IndexHandle::attach(index)
            .await
            .with_context(|| format!("No usable index in '{collection}', run without --eval-only"))?
    } else {
        let token_counter = default_token_counter();
        let corpus = load_corpus(&args.codebase, &config.corpus, token_counter.as_ref())?;
        info!(
            "Loaded {} files ({} tokens) from {}",
            corpus.len(),
            corpus.total_tokens(),
            args.codebase.display()
        );

        let handle = EmbeddingIndexer::new(embeddings.clone(), index, &config.embeddings)
            .with_progress(args.show_progress)
            .index(corpus.entries())
            .await
            .context("Indexing failed")?;
        if !handle.skipped().is_empty() {
            warn!(
                "{} files could not be indexed and will never be retrieved",
                handle.skipped().len()
            );
        }
        handle
    };

    let Some(benchmark) = benchmark else {
        info!(
            "Indexed {} files into '{}'",
            handle.indexed_count(),
            handle.collection_name()
        );
        return Ok(None);
    };

    let model = embeddings.model_name().to_string();
    let strategy = RagStrategy::new(SimilarityRetriever::new(handle, embeddings), top_k, model);
    let context = EvaluationContext::new(Arc::new(benchmark), &config.evaluation);

    let run = run_strategy(&context, &strategy).await?;
    run.save(&args.output)
        .with_context(|| format!("Failed to save results to {}", args.output.display()))?;
    info!("Results saved to {}", args.output.display());
    Ok(Some(run))
}
