//! Command handlers for the Passage CLI.

pub mod ask;
pub mod init;
pub mod search;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use init::InitCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;

use passage_core::{AppConfig, AppResult};
use passage_rag::Pipeline;

/// Assemble a pipeline from the merged configuration.
///
/// Chunking, retrieval, and embedding settings come from the workspace's
/// pipeline config; the answer-generation provider and model follow the
/// application config (flags > environment > config file > defaults).
pub(crate) async fn build_pipeline(config: &AppConfig) -> AppResult<Pipeline> {
    let mut pipeline_config = passage_rag::config::load_config(&config.workspace)?;

    pipeline_config.generation.provider = config.provider.clone();
    pipeline_config.generation.model = config.model.clone();
    if pipeline_config.generation.endpoint.is_none() {
        pipeline_config.generation.endpoint = config.endpoint.clone();
    }

    let api_key = config.resolve_api_key();

    let embedder = passage_rag::embeddings::create_provider(
        &pipeline_config.embedding,
        api_key.as_deref(),
    )
    .await?;

    let llm = passage_llm::create_client(
        &pipeline_config.generation.provider,
        pipeline_config.generation.endpoint.as_deref(),
        api_key.as_deref(),
    )?;

    let snapshot_path = passage_rag::config::get_snapshot_path(&config.workspace);

    Pipeline::new(
        config.corpus_dir.clone(),
        snapshot_path,
        pipeline_config,
        embedder,
        llm,
    )
}
