use thiserror::Error;

/// Failures on the write side: reading, parsing, and indexing a document.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("docx parse error: {0}")]
    DocxParse(String),

    #[error("unsupported file format: {0} (expected .pdf or .docx)")]
    UnsupportedFormat(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("indexing backend failed: {0}")]
    Backend(#[from] QueryError),
}

/// Failures on the read side and in outbound provider calls.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("generation request failed: {0}")]
    Generation(String),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    Request(String),
}

/// Fatal startup failures; the process must not serve requests past one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
