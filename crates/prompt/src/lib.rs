//! Prompt crate for Passage.
//!
//! Owns the fixed prompt contract for grounded answer generation: a
//! single instruction template that constrains the language model to the
//! retrieved context and tells it to say "I don't know" otherwise.

pub mod builder;
pub mod types;

// Re-export main surface
pub use builder::{build_answer_prompt, render_template, GROUNDED_ANSWER_TEMPLATE};
pub use types::BuiltPrompt;
