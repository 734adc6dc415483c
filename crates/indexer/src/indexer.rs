//! Embedding indexer
//!
//! Corpus entries are embedded in batches of `texts_per_api_request` with at
//! most `max_concurrent_api_requests` batches in flight. Completed batches
//! are upserted one at a time, in completion order. A batch whose embedding
//! or upsert fails is retried file by file, so a permanent failure costs
//! exactly the file that caused it.

use crate::handle::IndexHandle;
use crate::progress::create_progress_bar;
use crate::{IndexError, IndexStats};
use codeeval_core::config::EmbeddingsConfig;
use codeeval_core::error::{Error, Result};
use codeeval_core::CorpusEntry;
use codeeval_embeddings::{EmbeddingError, EmbeddingManager, EmbeddingTask};
use codeeval_storage::{IndexedFile, VectorIndex};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Builds a vector index from corpus entries
pub struct EmbeddingIndexer {
    embeddings: Arc<EmbeddingManager>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
    max_concurrent: usize,
    show_progress: bool,
}

/// Outcome of embedding one batch: ready points plus per-file failures
struct EmbeddedBatch {
    files: Vec<IndexedFile>,
    failed: Vec<IndexError>,
}

impl EmbeddingIndexer {
    pub fn new(
        embeddings: Arc<EmbeddingManager>,
        index: Arc<dyn VectorIndex>,
        config: &EmbeddingsConfig,
    ) -> Self {
        Self {
            embeddings,
            index,
            batch_size: config.texts_per_api_request.max(1),
            max_concurrent: config.max_concurrent_api_requests.max(1),
            show_progress: false,
        }
    }

    /// Show an indicatif progress bar while indexing
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Recreate the collection and index every entry
    ///
    /// Per-file failures are logged and listed in the handle's skipped
    /// files. Only failures of the collection itself are returned as errors.
    pub async fn index(&self, entries: &[CorpusEntry]) -> Result<IndexHandle> {
        let start = Instant::now();
        let dimension = self.embeddings.embedding_dimension();

        info!(
            "Indexing {} files into '{}' ({} dims, batches of {}, {} concurrent)",
            entries.len(),
            self.index.collection_name(),
            dimension,
            self.batch_size,
            self.max_concurrent
        );

        self.index.recreate(dimension).await?;

        let pb = create_progress_bar(entries.len(), self.show_progress);
        pb.set_message("Embedding files");

        let batches: Vec<&[CorpusEntry]> = entries.chunks(self.batch_size).collect();
        let batch_count = batches.len();

        let mut embedded = stream::iter(batches)
            .map(|batch| self.embed_batch(batch))
            .buffer_unordered(self.max_concurrent);

        let mut indexed_files = 0usize;
        let mut skipped: Vec<IndexError> = Vec::new();

        while let Some(batch) = embedded.next().await {
            let batch_len = batch.files.len() + batch.failed.len();
            skipped.extend(batch.failed);

            let (stored, failed) = self.upsert_batch(batch.files).await;
            indexed_files += stored;
            skipped.extend(failed);

            pb.inc(batch_len as u64);
        }

        pb.finish_with_message("Indexing complete");

        for failure in &skipped {
            warn!(
                "{}",
                Error::indexing(failure.file_path.clone(), failure.message.clone())
            );
        }

        let stats = IndexStats {
            total_files: entries.len(),
            indexed_files,
            skipped_files: skipped.len(),
            batches: batch_count,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "Indexing complete: {} files indexed, {} skipped in {:.2}s",
            stats.indexed_files,
            stats.skipped_files,
            stats.processing_time_ms as f64 / 1000.0
        );

        Ok(IndexHandle::new(
            self.index.clone(),
            indexed_files as u64,
            skipped,
            stats,
        ))
    }

    async fn embed_entries(
        &self,
        entries: &[CorpusEntry],
    ) -> std::result::Result<EmbeddedBatch, EmbeddingError> {
        let texts: Vec<String> = entries.iter().map(|e| e.content.clone()).collect();
        let vectors = self
            .embeddings
            .embed(texts, EmbeddingTask::Passage)
            .await?;
        Ok(self.collect_vectors(entries, vectors))
    }

    async fn embed_batch(&self, batch: &[CorpusEntry]) -> EmbeddedBatch {
        match self.embed_entries(batch).await {
            Ok(result) => result,
            Err(e) if batch.len() > 1 => {
                debug!(
                    "Batch of {} files failed ({e}), retrying files individually",
                    batch.len()
                );
                let mut result = EmbeddedBatch {
                    files: Vec::new(),
                    failed: Vec::new(),
                };
                for entry in batch {
                    match self.embed_entries(std::slice::from_ref(entry)).await {
                        Ok(single) => {
                            result.files.extend(single.files);
                            result.failed.extend(single.failed);
                        }
                        Err(e) => result
                            .failed
                            .push(IndexError::new(entry.path.clone(), e.to_string())),
                    }
                }
                result
            }
            Err(e) => EmbeddedBatch {
                files: Vec::new(),
                failed: batch
                    .iter()
                    .map(|entry| IndexError::new(entry.path.clone(), e.to_string()))
                    .collect(),
            },
        }
    }

    fn collect_vectors(
        &self,
        batch: &[CorpusEntry],
        vectors: Vec<Option<Vec<f32>>>,
    ) -> EmbeddedBatch {
        let mut result = EmbeddedBatch {
            files: Vec::with_capacity(batch.len()),
            failed: Vec::new(),
        };

        if vectors.len() != batch.len() {
            result.failed = batch
                .iter()
                .map(|entry| {
                    IndexError::new(
                        entry.path.clone(),
                        format!(
                            "expected {} embeddings, got {}",
                            batch.len(),
                            vectors.len()
                        ),
                    )
                })
                .collect();
            return result;
        }

        for (entry, vector) in batch.iter().zip(vectors) {
            match vector {
                Some(vector) => result.files.push(IndexedFile::new(
                    entry.path.clone(),
                    &entry.content,
                    entry.token_count,
                    vector,
                )),
                None => result.failed.push(IndexError::new(
                    entry.path.clone(),
                    "provider returned no embedding",
                )),
            }
        }
        result
    }

    /// Upsert a batch, falling back to one file at a time on failure
    ///
    /// Returns the number of stored files and the files that failed.
    async fn upsert_batch(&self, files: Vec<IndexedFile>) -> (usize, Vec<IndexError>) {
        if files.is_empty() {
            return (0, Vec::new());
        }

        let count = files.len();
        let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
        let fallback = (count > 1).then(|| files.clone());

        match self.index.upsert(files).await {
            Ok(()) => (count, Vec::new()),
            Err(e) => match fallback {
                Some(files) => {
                    debug!("Upsert of {count} files failed ({e}), retrying files individually");
                    let mut stored = 0;
                    let mut failed = Vec::new();
                    for file in files {
                        let path = file.path.clone();
                        match self.index.upsert(vec![file]).await {
                            Ok(()) => stored += 1,
                            Err(e) => failed.push(IndexError::new(path, e.to_string())),
                        }
                    }
                    (stored, failed)
                }
                None => (
                    0,
                    paths
                        .into_iter()
                        .map(|path| IndexError::new(path, e.to_string()))
                        .collect(),
                ),
            },
        }
    }
}
