//! Configuration management for Passage.
//!
//! Configuration merges three sources, later ones winning:
//! - Config file (`.passage/config.yaml` under the workspace)
//! - Environment variables (`PASSAGE_*`, `RUST_LOG`, `NO_COLOR`)
//! - Command-line flags
//!
//! The configuration is workspace-centric: the workspace holds the source
//! documents and all derived state under `.passage/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Holds the global options that affect behavior across commands; the
/// pipeline-specific knobs (chunking, retrieval, embedding) live with the
/// RAG crate's `PipelineConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .passage/)
    pub workspace: PathBuf,

    /// Directory scanned for source documents (defaults to the workspace)
    pub corpus_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Language-model provider ("ollama", "openai")
    pub provider: String,

    /// Model identifier for answer generation
    pub model: String,

    /// Optional custom endpoint for the provider
    pub endpoint: Option<String>,

    /// API key for providers that require one
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Config file structure (`.passage/config.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    corpus: Option<CorpusSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CorpusSection {
    dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            corpus_dir: workspace.clone(),
            workspace,
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, config file, and
    /// defaults.
    ///
    /// Environment variables:
    /// - `PASSAGE_WORKSPACE`: workspace path
    /// - `PASSAGE_CONFIG`: config file path
    /// - `PASSAGE_CORPUS`: corpus directory
    /// - `PASSAGE_PROVIDER`: LLM provider
    /// - `PASSAGE_MODEL`: model identifier
    /// - `PASSAGE_ENDPOINT`: provider endpoint
    /// - `PASSAGE_API_KEY`: API key
    /// - `RUST_LOG`: log level
    /// - `NO_COLOR`: disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("PASSAGE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
            config.corpus_dir = config.workspace.clone();
        }

        if let Ok(config_file) = std::env::var("PASSAGE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(".passage/config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override the config file
        if let Ok(corpus) = std::env::var("PASSAGE_CORPUS") {
            config.corpus_dir = PathBuf::from(corpus);
        }

        if let Ok(provider) = std::env::var("PASSAGE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("PASSAGE_MODEL") {
            config.model = model;
        }

        if let Ok(endpoint) = std::env::var("PASSAGE_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if config.api_key.is_none() {
            config.api_key = std::env::var("PASSAGE_API_KEY").ok();
        }

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(corpus) = config_file.corpus {
            if let Some(dir) = corpus.dir {
                let dir = PathBuf::from(dir);
                result.corpus_dir = if dir.is_absolute() {
                    dir
                } else {
                    result.workspace.join(dir)
                };
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = Some(endpoint);
            }
            if let Some(env_var) = llm.api_key_env {
                if let Ok(key) = std::env::var(&env_var) {
                    result.api_key = Some(key);
                }
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        corpus_dir: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            if corpus_dir.is_none() && self.corpus_dir == self.workspace {
                self.corpus_dir = workspace.clone();
            }
            self.workspace = workspace;
        }

        if let Some(corpus_dir) = corpus_dir {
            self.corpus_dir = corpus_dir;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .passage directory.
    pub fn passage_dir(&self) -> PathBuf {
        self.workspace.join(".passage")
    }

    /// Ensure the .passage directory exists.
    pub fn ensure_passage_dir(&self) -> AppResult<()> {
        let passage_dir = self.passage_dir();
        if !passage_dir.exists() {
            std::fs::create_dir_all(&passage_dir).map_err(|e| {
                AppError::Config(format!("Failed to create .passage directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolve the API key for the active provider.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        // Conventional fallback for the OpenAI provider
        if self.provider == "openai" {
            return std::env::var("OPENAI_API_KEY").ok();
        }

        None
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "openai"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.provider == "openai" && self.resolve_api_key().is_none() {
            return Err(AppError::Config(
                "OpenAI provider requires an API key (PASSAGE_API_KEY or OPENAI_API_KEY)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
