use crate::answer::AnswerGenerator;
use crate::error::{IngestError, QueryError};
use crate::ingest::load_sentences;
use crate::models::{AnswerResult, ChunkRecord, SourceRef};
use crate::traits::{ChunkStore, EmbeddingProvider, Generator};
use std::path::Path;
use tracing::info;

pub const DEFAULT_TOP_K: usize = 5;

const SNIPPET_MAX_CHARS: usize = 200;

/// Composes embedding, retrieval, and answer generation into the full
/// question-answering pipeline, plus the document write path. All
/// collaborators are injected at construction; the pipeline holds no
/// process-global state.
pub struct RagPipeline<E, S, G>
where
    E: EmbeddingProvider,
    S: ChunkStore,
    G: Generator,
{
    embedder: E,
    store: S,
    generator: G,
    answerer: AnswerGenerator,
}

impl<E, S, G> RagPipeline<E, S, G>
where
    E: EmbeddingProvider + Send + Sync,
    S: ChunkStore + Send + Sync,
    G: Generator + Send + Sync,
{
    pub fn new(embedder: E, store: S, generator: G) -> Self {
        Self::with_answerer(embedder, store, generator, AnswerGenerator::default())
    }

    pub fn with_answerer(embedder: E, store: S, generator: G, answerer: AnswerGenerator) -> Self {
        Self {
            embedder,
            store,
            generator,
            answerer,
        }
    }

    /// Full query path: embed the question, retrieve the `top_k` most
    /// similar chunks (optionally restricted to one source file), generate
    /// the answer, and package provenance. Read-only against the store;
    /// sources keep retrieval-rank order.
    pub async fn search(
        &self,
        query: &str,
        top_k: usize,
        filename: Option<&str>,
    ) -> Result<AnswerResult, QueryError> {
        if query.trim().is_empty() {
            return Err(QueryError::Request("query is empty".to_string()));
        }

        let query_embedding = self.embedder.embed(query).await?;
        let matches = self
            .store
            .match_chunks(&query_embedding, top_k, filename)
            .await?;
        info!(hits = matches.len(), "retrieved candidate chunks");

        let answer = self.answerer.answer(&self.generator, query, &matches).await?;

        let sources = matches
            .iter()
            .map(|hit| SourceRef {
                filename: hit.filename.clone(),
                similarity: round_to_3dp(hit.similarity),
                snippet: hit.chunk_text.chars().take(SNIPPET_MAX_CHARS).collect(),
            })
            .collect();

        Ok(AnswerResult { answer, sources })
    }

    /// Indexes one document with per-sentence writes: each chunk is
    /// embedded and inserted in its own store call. A failure partway
    /// through leaves earlier chunks indexed; there is no rollback.
    pub async fn index_file(&self, path: &Path) -> Result<usize, IngestError> {
        let document = load_sentences(path)?;
        info!(
            filename = %document.filename,
            sentences = document.sentences.len(),
            "indexing document"
        );

        for sentence in &document.sentences {
            let embedding = self.embedder.embed(sentence).await?;
            let record =
                ChunkRecord::sentence(sentence.clone(), embedding, document.filename.clone());
            self.store.insert(&record).await?;
        }

        Ok(document.sentences.len())
    }

    /// Batch variant: embeds every sentence first, then flushes a single
    /// batch write. Still non-transactional; the batch either lands or the
    /// document is absent entirely.
    pub async fn index_file_batched(&self, path: &Path) -> Result<usize, IngestError> {
        let document = load_sentences(path)?;

        let mut records = Vec::with_capacity(document.sentences.len());
        for sentence in &document.sentences {
            let embedding = self.embedder.embed(sentence).await?;
            records.push(ChunkRecord::sentence(
                sentence.clone(),
                embedding,
                document.filename.clone(),
            ));
        }

        self.store.insert_batch(&records).await?;
        Ok(records.len())
    }
}

fn round_to_3dp(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::{RagPipeline, DEFAULT_TOP_K};
    use crate::error::QueryError;
    use crate::models::{ChunkRecord, RetrievalResult, SplitStrategy};
    use crate::traits::{ChunkStore, EmbeddingProvider, Generator};
    use async_trait::async_trait;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    /// Maps marker words onto axes so similarity is predictable in tests.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn dimensions(&self) -> usize {
            3
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, QueryError> {
            let mut vector = vec![0.0f32; 3];
            for (axis, marker) in ["Alpha", "Beta", "Gamma"].iter().enumerate() {
                if text.contains(marker) {
                    vector[axis] = 1.0;
                }
            }
            Ok(vector)
        }
    }

    /// Cosine-similarity store over an in-memory vec of records.
    #[derive(Default)]
    struct InMemoryStore {
        records: Mutex<Vec<ChunkRecord>>,
        fail_after: Option<usize>,
    }

    impl InMemoryStore {
        fn failing_after(writes: usize) -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail_after: Some(writes),
            }
        }

        fn records(&self) -> Vec<ChunkRecord> {
            self.records.lock().expect("records lock").clone()
        }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f64 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            0.0
        } else {
            f64::from(dot / (norm_a * norm_b))
        }
    }

    #[async_trait]
    impl ChunkStore for InMemoryStore {
        async fn insert(&self, chunk: &ChunkRecord) -> Result<(), QueryError> {
            let mut records = self.records.lock().expect("records lock");
            if let Some(limit) = self.fail_after {
                if records.len() >= limit {
                    return Err(QueryError::BackendResponse {
                        backend: "memory".to_string(),
                        details: "write refused".to_string(),
                    });
                }
            }
            records.push(chunk.clone());
            Ok(())
        }

        async fn insert_batch(&self, chunks: &[ChunkRecord]) -> Result<(), QueryError> {
            self.records
                .lock()
                .expect("records lock")
                .extend_from_slice(chunks);
            Ok(())
        }

        async fn match_chunks(
            &self,
            query_embedding: &[f32],
            top_k: usize,
            filter_filename: Option<&str>,
        ) -> Result<Vec<RetrievalResult>, QueryError> {
            let mut hits: Vec<RetrievalResult> = self
                .records
                .lock()
                .expect("records lock")
                .iter()
                .filter(|record| {
                    filter_filename.map_or(true, |wanted| record.filename == wanted)
                })
                .map(|record| RetrievalResult {
                    chunk_text: record.chunk_text.clone(),
                    filename: record.filename.clone(),
                    similarity: cosine(query_embedding, &record.embedding),
                })
                .collect();

            hits.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));
            hits.truncate(top_k);
            Ok(hits)
        }
    }

    /// Store that replays canned results, for packaging-only tests.
    struct FixedStore {
        hits: Vec<RetrievalResult>,
    }

    #[async_trait]
    impl ChunkStore for FixedStore {
        async fn insert(&self, _chunk: &ChunkRecord) -> Result<(), QueryError> {
            Ok(())
        }

        async fn insert_batch(&self, _chunks: &[ChunkRecord]) -> Result<(), QueryError> {
            Ok(())
        }

        async fn match_chunks(
            &self,
            _query_embedding: &[f32],
            _top_k: usize,
            _filter_filename: Option<&str>,
        ) -> Result<Vec<RetrievalResult>, QueryError> {
            Ok(self.hits.clone())
        }
    }

    struct FixedGenerator;

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, QueryError> {
            Ok("A grounded answer that is clearly longer than forty characters.".to_string())
        }
    }

    fn write_docx(path: &Path, body: &str) {
        let xml = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
                "<w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            ),
            body
        );
        let file = std::fs::File::create(path).expect("create docx");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(xml.as_bytes()).expect("write entry");
        writer.finish().expect("finish archive");
    }

    #[tokio::test]
    async fn indexing_writes_one_record_per_sentence() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("facts.docx");
        write_docx(&path, "Alpha is first. Beta is second. Gamma is third.");

        let pipeline = RagPipeline::new(KeywordEmbedder, InMemoryStore::default(), FixedGenerator);
        let count = pipeline.index_file(&path).await.expect("index should succeed");

        assert_eq!(count, 3);
        let records = pipeline.store.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|record| record.filename == "facts.docx"));
        assert!(records
            .iter()
            .all(|record| record.split_strategy == SplitStrategy::Sentence));
    }

    #[tokio::test]
    async fn query_returns_the_nearest_sentence_as_top_source() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("facts.docx");
        write_docx(&path, "Alpha is first. Beta is second. Gamma is third.");

        let pipeline = RagPipeline::new(KeywordEmbedder, InMemoryStore::default(), FixedGenerator);
        pipeline.index_file(&path).await.expect("index should succeed");

        let result = pipeline
            .search("Tell me about Beta", DEFAULT_TOP_K, None)
            .await
            .expect("search should succeed");

        assert_eq!(result.sources[0].snippet, "Beta is second.");
        assert_eq!(result.sources[0].similarity, 1.0);
    }

    #[tokio::test]
    async fn filename_filter_restricts_results_to_one_file() {
        let dir = tempdir().expect("tempdir");
        let first = dir.path().join("first.docx");
        let second = dir.path().join("second.docx");
        write_docx(&first, "Beta is described here in depth.");
        write_docx(&second, "Gamma gets a passing mention.");

        let pipeline = RagPipeline::new(KeywordEmbedder, InMemoryStore::default(), FixedGenerator);
        pipeline.index_file(&first).await.expect("index first");
        pipeline.index_file(&second).await.expect("index second");

        // Beta is the better global match, but the filter pins second.docx.
        let result = pipeline
            .search("Tell me about Beta", DEFAULT_TOP_K, Some("second.docx"))
            .await
            .expect("search should succeed");

        assert!(!result.sources.is_empty());
        assert!(result
            .sources
            .iter()
            .all(|source| source.filename == "second.docx"));
    }

    #[tokio::test]
    async fn sources_are_rounded_and_snippets_truncated() {
        let long_text = "y".repeat(250);
        let store = FixedStore {
            hits: vec![
                RetrievalResult {
                    chunk_text: long_text,
                    filename: "a.pdf".to_string(),
                    similarity: 0.876543,
                },
                RetrievalResult {
                    chunk_text: "short".to_string(),
                    filename: "b.pdf".to_string(),
                    similarity: 0.5,
                },
            ],
        };

        let pipeline = RagPipeline::new(KeywordEmbedder, store, FixedGenerator);
        let result = pipeline
            .search("anything", DEFAULT_TOP_K, None)
            .await
            .expect("search should succeed");

        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].snippet.chars().count(), 200);
        assert_eq!(result.sources[0].similarity, 0.877);
        // Retrieval-rank order is preserved in the packaged sources.
        assert_eq!(result.sources[0].filename, "a.pdf");
        assert_eq!(result.sources[1].filename, "b.pdf");
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let pipeline = RagPipeline::new(KeywordEmbedder, InMemoryStore::default(), FixedGenerator);
        let result = pipeline.search("   ", DEFAULT_TOP_K, None).await;
        assert!(matches!(result, Err(QueryError::Request(_))));
    }

    #[tokio::test]
    async fn mid_document_write_failure_leaves_partial_index() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("facts.docx");
        write_docx(&path, "Alpha is first. Beta is second. Gamma is third.");

        let pipeline =
            RagPipeline::new(KeywordEmbedder, InMemoryStore::failing_after(1), FixedGenerator);
        let result = pipeline.index_file(&path).await;

        assert!(result.is_err());
        assert_eq!(pipeline.store.records().len(), 1);
    }

    #[tokio::test]
    async fn batched_indexing_lands_every_sentence() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("facts.docx");
        write_docx(&path, "Alpha is first. Beta is second. Gamma is third.");

        let pipeline = RagPipeline::new(KeywordEmbedder, InMemoryStore::default(), FixedGenerator);
        let count = pipeline
            .index_file_batched(&path)
            .await
            .expect("batched index should succeed");

        assert_eq!(count, 3);
        assert_eq!(pipeline.store.records().len(), 3);
    }
}
