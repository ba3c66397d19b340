//! Embedding adapter for the pipeline.
//!
//! Provider-agnostic embedding generation behind the `EmbeddingProvider`
//! trait. The active provider's identity tag (`provider/model`) travels
//! with every index snapshot so a snapshot can never be silently queried
//! with a mismatched model.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::trigram::TrigramProvider;
