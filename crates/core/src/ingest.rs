use crate::chunking::split_sentences;
use crate::error::IngestError;
use crate::extractor::extract_text;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A document reduced to its provenance name and sentence chunks, ready for
/// embedding and storage.
pub struct DocumentSentences {
    pub filename: String,
    pub sentences: Vec<String>,
}

/// Extracts and chunks one file. Empty and whitespace-only sentences are
/// already discarded by the chunker.
pub fn load_sentences(path: &Path) -> Result<DocumentSentences, IngestError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
        .to_string();

    let text = extract_text(path)?;

    Ok(DocumentSentences {
        filename,
        sentences: split_sentences(&text),
    })
}

/// Recursively finds indexable documents (`.pdf` / `.docx`) under a folder,
/// sorted for deterministic ingestion order.
pub fn discover_document_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let indexable = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ext.eq_ignore_ascii_case("pdf") || ext.eq_ignore_ascii_case("docx")
            });

        if indexable {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}
