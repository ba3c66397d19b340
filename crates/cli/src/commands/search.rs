//! Search command handler.
//!
//! Retrieval-only queries: shows the ranked passages without calling the
//! language model.

use clap::Args;
use passage_core::{AppConfig, AppResult};

/// Retrieve passages without answer synthesis
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of passages to retrieve
    #[arg(short = 'k', long, default_value = "4")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command (top-{})", self.top_k);

        let pipeline = super::build_pipeline(config).await?;
        pipeline.initialize().await?;

        let results = pipeline.search(&self.query, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else if results.is_empty() {
            println!("No passages found");
        } else {
            for (i, result) in results.iter().enumerate() {
                println!(
                    "{:>2}. [{:.3}] {} (page {})",
                    i + 1,
                    result.score,
                    result.chunk.document_id,
                    result.chunk.page_index
                );

                let preview: String = result.chunk.text.chars().take(120).collect();
                println!("    {}", preview.replace('\n', " "));
            }
        }

        Ok(())
    }
}
