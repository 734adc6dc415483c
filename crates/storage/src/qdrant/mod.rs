// Private module - not exposed in public API
mod builder;
mod collections;
mod operations;
mod search;

pub(crate) use builder::QdrantIndexBuilder;

use qdrant_client::Qdrant;

/// Qdrant-backed [`crate::VectorIndex`] bound to one collection
pub(crate) struct QdrantIndex {
    pub(crate) client: Qdrant,
    pub(crate) collection_name: String,
    pub(crate) upsert_batch_size: usize,
}
