use crate::error::StorageError;
use crate::ScoredPath;
use codeeval_core::Error;
use qdrant_client::qdrant::{value::Kind, SearchPointsBuilder, Value as QdrantValue};
use std::collections::HashMap;

use super::QdrantIndex;

/// Convert a Qdrant payload to the stored path and token count
fn payload_to_path(payload: &HashMap<String, QdrantValue>) -> Option<(String, usize)> {
    let path = payload.get("path").and_then(|v| match v.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    })?;

    let token_count = payload
        .get("token_count")
        .and_then(|v| match v.kind.as_ref()? {
            Kind::IntegerValue(i) => usize::try_from(*i).ok(),
            Kind::DoubleValue(d) if *d >= 0.0 => Some(*d as usize),
            _ => None,
        })
        .unwrap_or(0);

    Some((path, token_count))
}

/// Search for files similar to the query vector
pub(super) async fn search_files(
    index: &QdrantIndex,
    query_vector: Vec<f32>,
    limit: usize,
) -> Result<Vec<ScoredPath>, Error> {
    let search_builder =
        SearchPointsBuilder::new(&index.collection_name, query_vector, limit as u64)
            .with_payload(true);

    let search_result = index
        .client
        .search_points(search_builder)
        .await
        .map_err(|e| StorageError::BackendError(format!("Search failed: {e}")))?;

    Ok(search_result
        .result
        .into_iter()
        .filter_map(|scored_point| {
            let (path, token_count) = payload_to_path(&scored_point.payload)?;
            Some(ScoredPath {
                path,
                score: scored_point.score,
                token_count,
            })
        })
        .collect())
}
