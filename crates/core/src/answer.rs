//! Two-stage answer generation: a strict context-grounded attempt first,
//! escalating to a hybrid context-plus-general-knowledge attempt when the
//! strict answer looks insufficient.

use crate::context::{build_context, DEFAULT_MAX_CONTEXT_CHARS};
use crate::error::QueryError;
use crate::models::RetrievalResult;
use crate::traits::Generator;
use tracing::debug;

pub const SYSTEM_INSTRUCTIONS: &str = "You are a helpful assistant. \
    Rely strictly on the provided context. \
    If the context is insufficient, explicitly say so.";

const INSUFFICIENCY_MARKER: &str = "not provide enough";
const MIN_SUFFICIENT_CHARS: usize = 40;

/// Judges whether a strict-stage answer warrants escalation.
pub type InsufficiencyPolicy = fn(&str) -> bool;

/// Default heuristic, kept byte-compatible with the deployed behavior: the
/// answer contains the marker substring (case-insensitive) or is shorter
/// than 40 characters. Not a semantic judgment.
pub fn is_insufficient(answer: &str) -> bool {
    answer.to_lowercase().contains(INSUFFICIENCY_MARKER)
        || answer.chars().count() < MIN_SUFFICIENT_CHARS
}

/// Orchestrates the strict-then-hybrid answer policy over any [`Generator`].
pub struct AnswerGenerator {
    max_context_chars: usize,
    insufficiency: InsufficiencyPolicy,
}

impl Default for AnswerGenerator {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            insufficiency: is_insufficient,
        }
    }
}

impl AnswerGenerator {
    pub fn new(max_context_chars: usize, insufficiency: InsufficiencyPolicy) -> Self {
        Self {
            max_context_chars,
            insufficiency,
        }
    }

    /// Runs the state machine: strict attempt, insufficiency check, and at
    /// most one hybrid attempt. The hybrid result is final. Generation
    /// failures propagate unchanged; there is no retry and no default
    /// answer.
    pub async fn answer<G>(
        &self,
        generator: &G,
        question: &str,
        results: &[RetrievalResult],
    ) -> Result<String, QueryError>
    where
        G: Generator + Sync + ?Sized,
    {
        let context = build_context(results, self.max_context_chars);

        let strict = generator
            .generate(&strict_prompt(&context, question))
            .await?
            .trim()
            .to_string();

        if !(self.insufficiency)(&strict) {
            return Ok(strict);
        }

        debug!("strict answer judged insufficient, escalating to hybrid");
        let hybrid = generator
            .generate(&hybrid_prompt(&context, question))
            .await?;
        Ok(hybrid.trim().to_string())
    }
}

fn strict_prompt(context: &str, question: &str) -> String {
    format!(
        "{SYSTEM_INSTRUCTIONS}\n\n\
         Context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Answer concisely and ONLY from the provided context. \
         If the context is insufficient, explicitly say: \
         'The context does not provide enough information.'"
    )
}

fn hybrid_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant.\n\n\
         Context:\n{context}\n\n\
         Question:\n{question}\n\n\
         Step 1: Try to answer based on context.\n\
         Step 2: If context is insufficient, add general knowledge but \
         clearly mark it as: '[General Knowledge] ...'."
    )
}
