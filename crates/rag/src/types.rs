//! RAG pipeline type definitions.

use serde::{Deserialize, Serialize};

/// One source file, identified by a stable name, with its extracted pages.
///
/// Documents exist only during ingestion; after chunking, only the derived
/// chunks persist.
#[derive(Debug, Clone)]
pub struct Document {
    /// Stable document identifier (the source file name)
    pub id: String,

    /// Extracted pages, in document order
    pub pages: Vec<Page>,
}

/// One unit of extracted text from a document.
#[derive(Debug, Clone)]
pub struct Page {
    /// Owning document identifier
    pub document_id: String,

    /// 0-based page index within the document
    pub page_index: u32,

    /// Text content of the page
    pub text: String,
}

/// A contiguous, size-bounded slice of a page's text.
///
/// Chunks are the unit of embedding and retrieval. They are created once
/// at index-build time and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content (length bounded by the configured chunk size)
    pub text: String,

    /// Source document identifier
    pub document_id: String,

    /// Source page index (0-based)
    pub page_index: u32,
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,

    /// Cosine similarity to the query vector, range [-1, 1]
    pub score: f32,
}

/// A source reference attached to a synthesized answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Source document identifier
    pub document_id: String,

    /// Source page index (0-based)
    pub page_index: u32,

    /// Bounded preview of the cited passage
    pub excerpt: String,
}

/// A grounded answer with its supporting citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Natural language answer synthesized by the LLM
    pub answer: String,

    /// Citations derived from the retrieved passages, in retrieval order
    pub citations: Vec<Citation>,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters of shared context between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of passages retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Maximum citation excerpt length in graphemes
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// Embedding adapter settings
    #[serde(default)]
    pub embedding: EmbeddingSettings,

    /// Answer generation settings
    #[serde(default)]
    pub generation: GenerationSettings,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    4
}

fn default_preview_chars() -> usize {
    200
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            preview_chars: default_preview_chars(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configured values.
    ///
    /// Enforces the chunker preconditions (`0 < chunk_overlap < chunk_size`)
    /// and sanity bounds on retrieval and embedding settings.
    pub fn validate(&self) -> passage_core::AppResult<()> {
        use passage_core::AppError;

        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }

        if self.chunk_overlap == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap must satisfy 0 < overlap < chunk_size (got overlap {}, size {})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be positive".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding batch_size must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Embedding adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name: "trigram", "ollama", "openai"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
        }
    }
}

/// Answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// LLM provider name: "ollama", "openai"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Optional custom endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Sampling temperature; 0 for deterministic decoding
    #[serde(default)]
    pub temperature: f32,

    /// Maximum tokens in a generated answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}
