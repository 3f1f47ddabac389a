pub mod answer;
pub mod chunking;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod stores;
pub mod traits;

pub use answer::{is_insufficient, AnswerGenerator, InsufficiencyPolicy, SYSTEM_INSTRUCTIONS};
pub use chunking::{normalize_whitespace, split_sentences};
pub use config::{AppConfig, DEFAULT_EMBEDDING_DIMENSIONS};
pub use context::{build_context, DEFAULT_MAX_CONTEXT_CHARS};
pub use embeddings::GeminiEmbedder;
pub use error::{ConfigError, IngestError, QueryError};
pub use extractor::extract_text;
pub use generation::GeminiGenerator;
pub use ingest::{discover_document_files, load_sentences, DocumentSentences};
pub use models::{AnswerResult, ChunkRecord, RetrievalResult, SourceRef, SplitStrategy};
pub use orchestrator::{RagPipeline, DEFAULT_TOP_K};
pub use stores::SupabaseStore;
pub use traits::{ChunkStore, EmbeddingProvider, Generator};
