//! Ask command handler.
//!
//! Answers a question from the indexed corpus and prints the cited
//! sources.

use clap::Args;
use passage_core::{AppConfig, AppResult};

/// Ask a question against the indexed corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let pipeline = super::build_pipeline(config).await?;
        pipeline.initialize().await?;

        let answer = pipeline.ask(&self.question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("Answer:");
            println!("{}", answer.answer);
            println!();

            if answer.citations.is_empty() {
                println!("Sources: (no sources available)");
            } else {
                println!("Sources:");
                for citation in &answer.citations {
                    println!(
                        "- {} (page {}): {}",
                        citation.document_id, citation.page_index, citation.excerpt
                    );
                }
            }
        }

        Ok(())
    }
}
