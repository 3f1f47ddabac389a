use crate::config::AppConfig;
use crate::error::QueryError;
use crate::models::{ChunkRecord, RetrievalResult};
use crate::traits::ChunkStore;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_TABLE: &str = "documents";
const DEFAULT_MATCH_RPC: &str = "match_documents";

/// Supabase (PostgREST) chunk store. Writes go to the documents table;
/// retrieval goes through the `match_documents` RPC, whose similarity
/// metric and tie-break order are owned by the database.
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
    match_rpc: String,
    vector_size: usize,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Result<Self, QueryError> {
        Ok(Self {
            client: Client::builder().timeout(config.request_timeout).build()?,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_key.clone(),
            table: DEFAULT_TABLE.to_string(),
            match_rpc: DEFAULT_MATCH_RPC.to_string(),
            vector_size: config.embedding_dimensions,
        })
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn rest_url(&self, resource: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, resource)
    }

    /// Every stored embedding must match the provider's fixed output
    /// dimensionality; mismatches are rejected before any request is sent.
    fn check_dimensions(&self, embedding: &[f32]) -> Result<(), QueryError> {
        if embedding.len() != self.vector_size {
            return Err(QueryError::Request(format!(
                "embedding dimension {} does not match configured {}",
                embedding.len(),
                self.vector_size
            )));
        }
        Ok(())
    }

    async fn post_rows(&self, body: &serde_json::Value) -> Result<(), QueryError> {
        let response = self
            .client
            .post(self.rest_url(&self.table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QueryError::BackendResponse {
                backend: "supabase".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }
}

/// Row shape returned by the match RPC. Missing fields default rather than
/// failing the whole result set.
#[derive(Debug, Deserialize)]
struct MatchRow {
    #[serde(default)]
    chunk_text: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    similarity: f64,
}

#[async_trait]
impl ChunkStore for SupabaseStore {
    async fn insert(&self, chunk: &ChunkRecord) -> Result<(), QueryError> {
        self.check_dimensions(&chunk.embedding)?;
        self.post_rows(&serde_json::to_value(chunk)?).await
    }

    async fn insert_batch(&self, chunks: &[ChunkRecord]) -> Result<(), QueryError> {
        if chunks.is_empty() {
            return Ok(());
        }
        for chunk in chunks {
            self.check_dimensions(&chunk.embedding)?;
        }
        self.post_rows(&serde_json::to_value(chunks)?).await
    }

    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        filter_filename: Option<&str>,
    ) -> Result<Vec<RetrievalResult>, QueryError> {
        self.check_dimensions(query_embedding)?;

        let response = self
            .client
            .post(self.rest_url(&format!("rpc/{}", self.match_rpc)))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "query_embedding": query_embedding,
                "match_count": top_k,
                "filter_filename": filter_filename,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QueryError::BackendResponse {
                backend: "supabase".to_string(),
                details: response.status().to_string(),
            });
        }

        let rows: Vec<MatchRow> = response.json().await?;
        Ok(rows
            .into_iter()
            .map(|row| RetrievalResult {
                chunk_text: row.chunk_text,
                filename: row.filename,
                similarity: row.similarity,
            })
            .collect())
    }
}
