//! Prompt builder for grounded answer generation.
//!
//! Renders the fixed answer template with the retrieved context and the
//! user's question. The template directs the model to answer only from
//! the supplied context and to decline when the context is insufficient.

use crate::types::BuiltPrompt;
use handlebars::Handlebars;
use passage_core::{AppError, AppResult};
use std::collections::HashMap;

/// The fixed instruction template for grounded answering.
///
/// Variables: `context` (concatenated retrieved passages) and `question`.
pub const GROUNDED_ANSWER_TEMPLATE: &str = "\
Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context:
{{context}}

Question: {{question}}

Answer:";

/// Build the grounded answer prompt for a question and its context.
///
/// The whole template renders into a single user message; no system
/// message is used, so the same prompt works across providers.
pub fn build_answer_prompt(question: &str, context: &str) -> AppResult<BuiltPrompt> {
    let mut variables = HashMap::new();
    variables.insert("context".to_string(), context.to_string());
    variables.insert("question".to_string(), question.to_string());

    let user = render_template(GROUNDED_ANSWER_TEMPLATE, &variables)?;

    tracing::debug!(
        "Built answer prompt ({} chars context, {} chars question)",
        context.len(),
        question.len()
    );

    Ok(BuiltPrompt::new(None, user))
}

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Config(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Config(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
