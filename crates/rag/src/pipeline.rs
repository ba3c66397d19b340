//! Pipeline orchestration.
//!
//! The `Pipeline` owns the whole question-answering flow and its state.
//! Initialization either loads an existing index snapshot or runs the full
//! ingestion build (extract → chunk → embed → persist); afterwards the
//! pipeline is ready and `ask` can be called concurrently, since the
//! index is read-only from then on. There are no process-wide
//! singletons: all state lives in the instance.

use crate::chunker;
use crate::embeddings::EmbeddingProvider;
use crate::extract::{self, default_extractors, Extractor};
use crate::index::{self, VectorIndex};
use crate::retriever::Retriever;
use crate::synthesize::AnswerSynthesizer;
use crate::types::{Answer, Document, PipelineConfig, ScoredChunk};
use passage_core::{AppError, AppResult};
use passage_llm::LlmClient;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use walkdir::WalkDir;

/// Pipeline lifecycle states.
///
/// `Uninitialized → Building → Ready` on a first-time build, or
/// `Uninitialized → Loading → Ready` when a snapshot already exists.
/// A failed build or load returns to `Uninitialized`; the caller
/// remediates and re-invokes; nothing is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Building,
    Loading,
    Ready,
}

struct Shared {
    state: PipelineState,
    index: Option<Arc<VectorIndex>>,
}

/// The question-answering pipeline.
pub struct Pipeline {
    corpus_dir: PathBuf,
    snapshot_path: PathBuf,
    config: PipelineConfig,
    extractors: Vec<Box<dyn Extractor>>,
    embedder: Arc<dyn EmbeddingProvider>,
    synthesizer: AnswerSynthesizer,
    shared: RwLock<Shared>,
    init_lock: tokio::sync::Mutex<()>,
}

impl Pipeline {
    /// Create a pipeline with the default extractor set.
    pub fn new(
        corpus_dir: impl Into<PathBuf>,
        snapshot_path: impl Into<PathBuf>,
        config: PipelineConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
    ) -> AppResult<Self> {
        config.validate()?;

        let synthesizer =
            AnswerSynthesizer::new(llm, config.generation.clone(), config.preview_chars);

        Ok(Self {
            corpus_dir: corpus_dir.into(),
            snapshot_path: snapshot_path.into(),
            config,
            extractors: default_extractors(),
            embedder,
            synthesizer,
            shared: RwLock::new(Shared {
                state: PipelineState::Uninitialized,
                index: None,
            }),
            init_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Replace the extractor set (front ends with custom formats).
    pub fn with_extractors(mut self, extractors: Vec<Box<dyn Extractor>>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.shared.read().unwrap().state
    }

    /// Where this pipeline persists its snapshot.
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Bring the pipeline to `Ready`.
    ///
    /// Loads the snapshot when one exists at the configured location,
    /// otherwise runs the full ingestion build. Concurrent callers are
    /// serialized; once one succeeds the rest observe `Ready` and return
    /// immediately. On failure the state returns to `Uninitialized` and
    /// the error surfaces to the caller.
    pub async fn initialize(&self) -> AppResult<()> {
        let _guard = self.init_lock.lock().await;

        if self.state() == PipelineState::Ready {
            tracing::debug!("Pipeline already initialized");
            return Ok(());
        }

        let result = if self.snapshot_path.exists() {
            self.set_state(PipelineState::Loading);
            tracing::info!("Loading index snapshot from {:?}", self.snapshot_path);
            index::load_index(&self.snapshot_path, self.embedder.as_ref())
        } else {
            self.set_state(PipelineState::Building);
            tracing::info!(
                "No snapshot at {:?}; building index from corpus {:?}",
                self.snapshot_path,
                self.corpus_dir
            );
            self.build().await
        };

        match result {
            Ok(built) => {
                tracing::info!("Pipeline ready ({} records)", built.len());
                let mut shared = self.shared.write().unwrap();
                shared.index = Some(Arc::new(built));
                shared.state = PipelineState::Ready;
                Ok(())
            }
            Err(e) => {
                self.set_state(PipelineState::Uninitialized);
                Err(e)
            }
        }
    }

    /// Answer a question from the indexed corpus.
    ///
    /// Fails with `NotInitialized` before `initialize` has completed.
    /// Safe to call concurrently once ready; callers share the read-only
    /// index.
    pub async fn ask(&self, question: &str) -> AppResult<Answer> {
        let index = self.ready_index()?;

        let retriever = Retriever::new(index, Arc::clone(&self.embedder), self.config.top_k);
        let passages = retriever.retrieve(question).await?;

        tracing::info!(
            "Retrieved {} passages for question, synthesizing answer",
            passages.len()
        );

        self.synthesizer.synthesize(question, &passages).await
    }

    /// Retrieve passages for a query without answer synthesis.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<ScoredChunk>> {
        let index = self.ready_index()?;

        Retriever::new(index, Arc::clone(&self.embedder), self.config.top_k)
            .retrieve_with_k(query, k)
            .await
    }

    fn ready_index(&self) -> AppResult<Arc<VectorIndex>> {
        let shared = self.shared.read().unwrap();
        match (&shared.state, &shared.index) {
            (PipelineState::Ready, Some(index)) => Ok(Arc::clone(index)),
            _ => Err(AppError::NotInitialized),
        }
    }

    fn set_state(&self, state: PipelineState) {
        self.shared.write().unwrap().state = state;
    }

    /// Run the full ingestion build: scan → extract → chunk → embed →
    /// persist. All-or-nothing: one unreadable document aborts the whole
    /// build.
    async fn build(&self) -> AppResult<VectorIndex> {
        let files = self.scan_corpus()?;

        if files.is_empty() {
            return Err(AppError::CorpusEmpty(format!(
                "no supported documents found in {:?}",
                self.corpus_dir
            )));
        }

        tracing::info!("Ingesting {} documents from {:?}", files.len(), self.corpus_dir);

        let mut documents = Vec::new();
        for path in &files {
            let extractor = self
                .extractors
                .iter()
                .find(|ex| ex.supports(path))
                .ok_or_else(|| AppError::UnreadableDocument {
                    path: path.clone(),
                    reason: "no extractor for file".to_string(),
                })?;

            let pages = extractor.extract(path)?;
            tracing::debug!(
                "Extracted {} pages from {:?} ({})",
                pages.len(),
                path,
                extractor.name()
            );
            documents.push(Document {
                id: extract::document_id(path),
                pages,
            });
        }

        // Documents are not retained past this point; only their chunks
        // feed the index
        let mut chunks = Vec::new();
        for document in &documents {
            chunks.extend(chunker::split_pages(
                &document.pages,
                self.config.chunk_size,
                self.config.chunk_overlap,
            ));
        }

        if chunks.is_empty() {
            return Err(AppError::CorpusEmpty(format!(
                "documents in {:?} contained no extractable text",
                self.corpus_dir
            )));
        }

        index::build_index(
            &chunks,
            self.embedder.as_ref(),
            self.config.embedding.batch_size,
            &self.snapshot_path,
        )
        .await
    }

    /// Collect the supported corpus files in deterministic order.
    fn scan_corpus(&self) -> AppResult<Vec<PathBuf>> {
        if !self.corpus_dir.exists() {
            return Err(AppError::CorpusEmpty(format!(
                "corpus directory {:?} does not exist",
                self.corpus_dir
            )));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.corpus_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Skip hidden entries (including .passage state) below the root
                e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if entry.file_type().is_file() && self.extractors.iter().any(|ex| ex.supports(path)) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}
