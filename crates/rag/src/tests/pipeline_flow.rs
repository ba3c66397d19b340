//! End-to-end tests for the pipeline state machine and ask flow.

use crate::embeddings::TrigramProvider;
use crate::pipeline::{Pipeline, PipelineState};
use crate::types::PipelineConfig;
use passage_core::{AppError, AppResult};
use passage_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Test double that echoes a canned completion.
#[derive(Debug)]
struct StaticLlm {
    reply: String,
}

impl StaticLlm {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for StaticLlm {
    fn provider_name(&self) -> &str {
        "static"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        Ok(LlmResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

fn test_pipeline(corpus: &Path, snapshot: &Path, dimensions: usize) -> Pipeline {
    let mut config = PipelineConfig::default();
    config.embedding.dimensions = dimensions;

    Pipeline::new(
        corpus,
        snapshot,
        config,
        Arc::new(TrigramProvider::new(dimensions)),
        StaticLlm::new("Causal component analysis studies X."),
    )
    .unwrap()
}

/// The reference two-page corpus from the end-to-end scenario.
fn write_reference_corpus(corpus: &Path) {
    std::fs::write(
        corpus.join("paper.txt"),
        "Causal component analysis studies X.\u{0c}Further detail on X.",
    )
    .unwrap();
}

#[tokio::test]
async fn test_first_time_build_reaches_ready() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    let pipeline = test_pipeline(temp.path(), &snapshot, 128);
    assert_eq!(pipeline.state(), PipelineState::Uninitialized);

    pipeline.initialize().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Ready);
    assert!(snapshot.exists());
}

#[tokio::test]
async fn test_end_to_end_ask_with_citations() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    let pipeline = test_pipeline(temp.path(), &snapshot, 128);
    pipeline.initialize().await.unwrap();

    // Two pages, each under the chunk size: exactly one chunk per page
    let passages = pipeline.search("anything at all", 10).await.unwrap();
    assert_eq!(passages.len(), 2);

    // The page about the topic must rank first
    let ranked = pipeline
        .search("What is causal component analysis?", 4)
        .await
        .unwrap();
    assert!(ranked[0].chunk.text.contains("Causal component analysis studies X."));
    assert_eq!(ranked[0].chunk.document_id, "paper.txt");
    assert_eq!(ranked[0].chunk.page_index, 0);

    let answer = pipeline
        .ask("What is causal component analysis?")
        .await
        .unwrap();
    assert_eq!(answer.answer, "Causal component analysis studies X.");
    assert!(!answer.citations.is_empty());
    assert_eq!(answer.citations[0].document_id, "paper.txt");
    assert_eq!(answer.citations[0].page_index, 0);
    assert!(answer.citations[0].excerpt.contains("Causal component"));
}

#[tokio::test]
async fn test_ask_before_initialize_fails() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    let pipeline = test_pipeline(temp.path(), &snapshot, 128);

    let result = pipeline.ask("question?").await;
    assert!(matches!(result, Err(AppError::NotInitialized)));

    let result = pipeline.search("query", 4).await;
    assert!(matches!(result, Err(AppError::NotInitialized)));
}

#[tokio::test]
async fn test_empty_corpus_fails_and_stays_uninitialized() {
    let temp = TempDir::new().unwrap();
    let corpus = temp.path().join("empty");
    std::fs::create_dir_all(&corpus).unwrap();
    let snapshot = temp.path().join("index.sqlite");

    let pipeline = test_pipeline(&corpus, &snapshot, 128);

    let result = pipeline.initialize().await;
    assert!(matches!(result, Err(AppError::CorpusEmpty(_))));
    assert_eq!(pipeline.state(), PipelineState::Uninitialized);
    assert!(!snapshot.exists());
}

#[tokio::test]
async fn test_second_pipeline_loads_existing_snapshot() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    let first = test_pipeline(temp.path(), &snapshot, 128);
    first.initialize().await.unwrap();

    let built_results = first
        .search("What is causal component analysis?", 4)
        .await
        .unwrap();

    // A fresh pipeline over the same location loads instead of rebuilding,
    // and answers queries identically
    let second = test_pipeline(temp.path(), &snapshot, 128);
    second.initialize().await.unwrap();
    assert_eq!(second.state(), PipelineState::Ready);

    let loaded_results = second
        .search("What is causal component analysis?", 4)
        .await
        .unwrap();

    assert_eq!(built_results.len(), loaded_results.len());
    for (a, b) in built_results.iter().zip(&loaded_results) {
        assert_eq!(a.chunk, b.chunk);
        assert!((a.score - b.score).abs() < 1e-6);
    }
}

#[tokio::test]
async fn test_load_rejects_mismatched_dimensions() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    // Build under 1536 dimensions
    let first = test_pipeline(temp.path(), &snapshot, 1536);
    first.initialize().await.unwrap();

    // Loading under 768 dimensions must be rejected
    let second = test_pipeline(temp.path(), &snapshot, 768);
    let result = second.initialize().await;
    assert!(matches!(result, Err(AppError::SnapshotCorrupt(_))));
    assert_eq!(second.state(), PipelineState::Uninitialized);
}

#[tokio::test]
async fn test_unreadable_document_aborts_whole_build() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());
    std::fs::write(temp.path().join("broken.pdf"), b"not really a pdf").unwrap();

    let pipeline = test_pipeline(temp.path(), &snapshot, 128);

    let result = pipeline.initialize().await;
    assert!(matches!(result, Err(AppError::UnreadableDocument { .. })));
    assert_eq!(pipeline.state(), PipelineState::Uninitialized);
    assert!(!snapshot.exists(), "a failed build must not leave a snapshot");
}

#[tokio::test]
async fn test_embedding_failure_leaves_no_snapshot() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    // Whitespace-only page: chunked, but the adapter refuses to embed it
    std::fs::write(temp.path().join("blank.txt"), "   ").unwrap();

    let pipeline = test_pipeline(temp.path(), &snapshot, 128);

    let result = pipeline.initialize().await;
    assert!(matches!(result, Err(AppError::Embedding(_))));
    assert!(!snapshot.exists());
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    let pipeline = test_pipeline(temp.path(), &snapshot, 128);
    pipeline.initialize().await.unwrap();
    pipeline.initialize().await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Ready);
}

#[tokio::test]
async fn test_concurrent_asks_share_the_index() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    let pipeline = Arc::new(test_pipeline(temp.path(), &snapshot, 128));
    pipeline.initialize().await.unwrap();

    let a = pipeline.ask("What is causal component analysis?");
    let b = pipeline.ask("What further detail exists?");
    let (first, second) = tokio::join!(a, b);

    assert!(first.is_ok());
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_concurrent_initialize_is_serialized() {
    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("index.sqlite");
    write_reference_corpus(temp.path());

    let pipeline = Arc::new(test_pipeline(temp.path(), &snapshot, 128));

    let a = pipeline.initialize();
    let b = pipeline.initialize();
    let (first, second) = tokio::join!(a, b);

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(pipeline.state(), PipelineState::Ready);
}
