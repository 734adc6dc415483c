use crate::error::StorageError;
use crate::IndexedFile;
use codeeval_core::Error;
use qdrant_client::qdrant::{PointStruct, UpsertPointsBuilder};
use serde_json::json;

use super::QdrantIndex;

/// Convert an IndexedFile to a Qdrant PointStruct
fn file_to_point(file: IndexedFile) -> PointStruct {
    let mut payload = serde_json::Map::new();
    payload.insert("path".to_string(), json!(file.path));
    payload.insert("token_count".to_string(), json!(file.token_count));
    payload.insert("preview".to_string(), json!(file.preview));

    PointStruct::new(file.point_id().to_string(), file.vector, payload)
}

/// Upsert files in batches of `upsert_batch_size`
pub(super) async fn upsert_files(
    index: &QdrantIndex,
    files: Vec<IndexedFile>,
) -> Result<(), Error> {
    if files.is_empty() {
        return Ok(());
    }

    let points: Vec<PointStruct> = files.into_iter().map(file_to_point).collect();

    for (batch_idx, chunk) in points.chunks(index.upsert_batch_size).enumerate() {
        let upsert_operation =
            UpsertPointsBuilder::new(&index.collection_name, chunk.to_vec()).wait(true);

        index
            .client
            .upsert_points(upsert_operation)
            .await
            .map_err(|e| {
                StorageError::BackendError(format!("Failed to upsert batch {batch_idx}: {e}"))
            })?;
    }

    Ok(())
}
