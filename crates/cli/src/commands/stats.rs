//! Stats command handler.
//!
//! Shows index snapshot statistics.

use clap::Args;
use passage_core::{AppConfig, AppResult};

/// Show index snapshot statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let snapshot_path = passage_rag::config::get_snapshot_path(&config.workspace);
        let stats = passage_rag::snapshot_stats(&snapshot_path)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Index snapshot: {}", snapshot_path.display());
            println!("  Records: {}", stats.record_count);
            println!("  Dimensions: {}", stats.dimensions);
            println!("  Embedding model: {}", stats.embedding_identity);
            println!("  Created: {}", stats.created_at);
            println!("  Size: {} bytes", stats.size_bytes);
        }

        Ok(())
    }
}
