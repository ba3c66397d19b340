//! Error types for Passage.
//!
//! This module defines a unified error enum covering every failure category
//! in the pipeline: configuration, I/O, corpus ingestion, embedding, index
//! snapshots, answer generation, and API misuse.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for Passage.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No source documents were found at ingestion time
    #[error("Corpus is empty: {0}")]
    CorpusEmpty(String),

    /// A source document could not be extracted; the whole build aborts
    #[error("Unreadable document {path:?}: {reason}")]
    UnreadableDocument { path: PathBuf, reason: String },

    /// Embedding adapter failure, at build or query time
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// No index snapshot exists at the given location
    #[error("Index snapshot not found at {0:?}")]
    SnapshotNotFound(PathBuf),

    /// The snapshot exists but cannot be trusted (schema damage or
    /// embedding-model identity mismatch)
    #[error("Index snapshot rejected: {0}")]
    SnapshotCorrupt(String),

    /// Language-model failure during answer synthesis
    #[error("Generation error: {0}")]
    Generation(String),

    /// `ask` was called before the pipeline reached the ready state
    #[error("Pipeline not initialized: call initialize() before ask()")]
    NotInitialized,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
