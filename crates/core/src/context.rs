use crate::models::RetrievalResult;

pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 6000;

/// Assembles ranked retrieval results into one labeled context block under a
/// character budget.
///
/// Greedy prefix-fit: results are taken in the given order and assembly
/// stops at the first piece that would push the cumulative size over
/// `max_chars`, even if a smaller later piece would still fit. Callers must
/// not assume every within-budget result gets included. Separator lines are
/// not counted against the budget. Chunk text is included verbatim, with no
/// sanitization against instruction-like content.
pub fn build_context(results: &[RetrievalResult], max_chars: usize) -> String {
    let mut pieces = Vec::new();
    let mut size = 0usize;

    for result in results {
        let piece = format!(
            "[{} | score={:.3}]\n{}\n",
            result.filename, result.similarity, result.chunk_text
        );
        let piece_chars = piece.chars().count();
        if size + piece_chars > max_chars {
            break;
        }
        size += piece_chars;
        pieces.push(piece);
    }

    pieces.join("\n---\n")
}
