//! Passage CLI
//!
//! Main entry point for the passage command-line tool: question answering
//! over a local document corpus with retrieval-augmented generation.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, InitCommand, SearchCommand, StatsCommand};
use passage_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Passage - ask questions against a document corpus
#[derive(Parser, Debug)]
#[command(name = "passage")]
#[command(about = "Question answering over a document corpus with RAG", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "PASSAGE_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Directory holding the source documents (default: the workspace)
    #[arg(long, global = true, env = "PASSAGE_CORPUS")]
    corpus: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PASSAGE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai)
    #[arg(short, long, global = true, env = "PASSAGE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "PASSAGE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the index snapshot (or reuse an existing one)
    Init(InitCommand),

    /// Ask a question against the indexed corpus
    Ask(AskCommand),

    /// Retrieve passages without answer synthesis
    Search(SearchCommand),

    /// Show index snapshot statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.corpus,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Passage CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Corpus: {:?}", config.corpus_dir);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Ensure the .passage directory exists
    config.ensure_passage_dir()?;

    let command_name = match &cli.command {
        Commands::Init(_) => "init",
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Init(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
