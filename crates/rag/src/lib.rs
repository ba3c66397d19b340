//! Retrieval-augmented question answering core.
//!
//! Everything between raw documents and a grounded answer lives here:
//! page extraction, chunking, embedding, the persisted vector index,
//! retrieval, answer synthesis, and the pipeline orchestrator that ties
//! them together behind `initialize()` / `ask()`.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod index;
pub mod pipeline;
pub mod retriever;
pub mod synthesize;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use index::{snapshot_stats, SnapshotStats, VectorIndex};
pub use pipeline::{Pipeline, PipelineState};
pub use retriever::Retriever;
pub use synthesize::AnswerSynthesizer;
pub use types::{
    Answer, Chunk, Citation, Document, EmbeddingSettings, GenerationSettings, Page,
    PipelineConfig, ScoredChunk,
};
