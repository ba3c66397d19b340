//! Init command handler.
//!
//! Builds the index snapshot from the corpus, or reuses an existing one.

use clap::Args;
use passage_core::{AppConfig, AppResult};

/// Build the index snapshot (or reuse an existing one)
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Discard any existing snapshot and rebuild from the corpus
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InitCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing init command (rebuild: {})", self.rebuild);

        let snapshot_path = passage_rag::config::get_snapshot_path(&config.workspace);

        if self.rebuild && snapshot_path.exists() {
            std::fs::remove_file(&snapshot_path)?;
            tracing::info!("Removed existing snapshot for rebuild");
        }

        let pipeline = super::build_pipeline(config).await?;
        pipeline.initialize().await?;

        let stats = passage_rag::snapshot_stats(pipeline.snapshot_path())?;

        if self.json {
            let output = serde_json::json!({
                "snapshot": pipeline.snapshot_path(),
                "recordCount": stats.record_count,
                "dimensions": stats.dimensions,
                "embeddingIdentity": stats.embedding_identity,
                "createdAt": stats.created_at,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Index ready: {} records, {} dims, model {} ({})",
                stats.record_count,
                stats.dimensions,
                stats.embedding_identity,
                pipeline.snapshot_path().display()
            );
        }

        Ok(())
    }
}
