use crate::error::QueryError;
use crate::models::{ChunkRecord, RetrievalResult};
use async_trait::async_trait;

/// Maps text to a fixed-dimensionality vector. Determinism is not part of
/// the contract.
#[async_trait]
pub trait EmbeddingProvider {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, QueryError>;
}

/// Persists chunk records and answers approximate nearest-neighbor queries
/// over their embeddings. Similarity metric and tie-break order are
/// store-defined.
#[async_trait]
pub trait ChunkStore {
    async fn insert(&self, chunk: &ChunkRecord) -> Result<(), QueryError>;

    async fn insert_batch(&self, chunks: &[ChunkRecord]) -> Result<(), QueryError>;

    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter_filename: Option<&str>,
    ) -> Result<Vec<RetrievalResult>, QueryError>;
}

/// Single-shot text generation. No streaming, no internal retry: failures
/// propagate to the caller.
#[async_trait]
pub trait Generator {
    async fn generate(&self, prompt: &str) -> Result<String, QueryError>;
}
