use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a document was split into chunks. Only sentence splitting exists
/// today; the enum keeps the stored records self-describing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    Sentence,
}

/// A stored unit of indexed text: one sentence, its embedding, and
/// provenance. Immutable once written; there is no update path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_text: String,
    pub embedding: Vec<f32>,
    pub filename: String,
    pub split_strategy: SplitStrategy,
    pub created_at: DateTime<Utc>,
}

impl ChunkRecord {
    pub fn sentence(chunk_text: String, embedding: Vec<f32>, filename: String) -> Self {
        Self {
            chunk_text,
            embedding,
            filename,
            split_strategy: SplitStrategy::Sentence,
            created_at: Utc::now(),
        }
    }
}

/// One retrieval hit, ranked descending by similarity. Tie order is
/// store-defined: stable but arbitrary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk_text: String,
    pub filename: String,
    pub similarity: f64,
}

/// Provenance entry attached to an answer: where a retrieved chunk came
/// from, how similar it was, and a short preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub filename: String,
    pub similarity: f64,
    pub snippet: String,
}

/// Final packaged response for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}
