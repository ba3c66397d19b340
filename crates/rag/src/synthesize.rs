//! Grounded answer synthesis.
//!
//! Combines the retrieved passages and the question into the fixed prompt
//! contract, delegates generation to the language-model collaborator with
//! deterministic decoding, and derives one citation per passage from the
//! passage metadata. No verification that the answer actually used a
//! citation takes place.

use crate::types::{Answer, Citation, GenerationSettings, ScoredChunk};
use passage_core::{AppError, AppResult};
use passage_llm::{LlmClient, LlmRequest};
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Answer synthesizer backed by an LLM collaborator.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    settings: GenerationSettings,
    preview_chars: usize,
}

impl AnswerSynthesizer {
    /// Create a synthesizer.
    pub fn new(llm: Arc<dyn LlmClient>, settings: GenerationSettings, preview_chars: usize) -> Self {
        Self {
            llm,
            settings,
            preview_chars,
        }
    }

    /// Synthesize a grounded answer from retrieved passages.
    ///
    /// Passages must be in retrieval order (similarity-descending); the
    /// prompt preserves that order and the citations mirror it. Fails
    /// with `AppError::Generation` when the collaborator errors or
    /// returns an empty response.
    pub async fn synthesize(
        &self,
        question: &str,
        passages: &[ScoredChunk],
    ) -> AppResult<Answer> {
        let context = build_context(passages);
        let prompt = passage_prompt::build_answer_prompt(question, &context)?;

        let mut request = LlmRequest::new(prompt.user, &self.settings.model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        tracing::info!(
            "Synthesizing answer from {} passages (model: {})",
            passages.len(),
            self.settings.model
        );

        let response = self.llm.complete(&request).await?;

        if response.content.trim().is_empty() {
            return Err(AppError::Generation(
                "Language model returned an empty response".to_string(),
            ));
        }

        let citations = passages
            .iter()
            .map(|passage| Citation {
                document_id: passage.chunk.document_id.clone(),
                page_index: passage.chunk.page_index,
                excerpt: truncate_excerpt(&passage.chunk.text, self.preview_chars),
            })
            .collect();

        Ok(Answer {
            answer: response.content.trim().to_string(),
            citations,
        })
    }
}

/// Concatenate passages into the context block of the prompt.
///
/// Passages keep their retrieval order and are labeled with their source
/// document and page so the model can ground its answer.
fn build_context(passages: &[ScoredChunk]) -> String {
    let parts: Vec<String> = passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            format!(
                "[{}] {} (page {})\n{}",
                i + 1,
                passage.chunk.document_id,
                passage.chunk.page_index,
                passage.chunk.text
            )
        })
        .collect();

    parts.join("\n\n---\n\n")
}

/// Truncate a passage to a bounded, grapheme-safe excerpt.
fn truncate_excerpt(text: &str, max_graphemes: usize) -> String {
    match text.grapheme_indices(true).nth(max_graphemes) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
