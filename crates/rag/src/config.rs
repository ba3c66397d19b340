//! Pipeline configuration management.

use crate::types::PipelineConfig;
use passage_core::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Load the pipeline configuration for a workspace.
///
/// Loads from `.passage/pipeline.yaml` if it exists, otherwise returns the
/// reference defaults (chunk size 1000, overlap 200, top-k 4).
pub fn load_config(workspace: &Path) -> AppResult<PipelineConfig> {
    let config_path = get_config_path(workspace);

    let config = if config_path.exists() {
        let content = fs::read_to_string(&config_path).map_err(|e| {
            AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
        })?;

        let config: PipelineConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
        })?;

        tracing::debug!("Loaded pipeline config from {:?}", config_path);
        config
    } else {
        tracing::debug!("No pipeline config at {:?}, using defaults", config_path);
        PipelineConfig::default()
    };

    config.validate()?;
    Ok(config)
}

/// Save the pipeline configuration for a workspace.
pub fn save_config(workspace: &Path, config: &PipelineConfig) -> AppResult<()> {
    let config_path = get_config_path(workspace);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Config(format!("Failed to create config directory: {}", e))
        })?;
    }

    let yaml = serde_yaml::to_string(config)
        .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(&config_path, yaml).map_err(|e| {
        AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
    })?;

    tracing::debug!("Saved pipeline config to {:?}", config_path);
    Ok(())
}

/// Get the state directory for a workspace.
pub fn get_passage_dir(workspace: &Path) -> PathBuf {
    workspace.join(".passage")
}

/// Get the pipeline config path for a workspace.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    get_passage_dir(workspace).join("pipeline.yaml")
}

/// Get the index snapshot path for a workspace.
pub fn get_snapshot_path(workspace: &Path) -> PathBuf {
    get_passage_dir(workspace).join("index.sqlite")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = load_config(temp.path()).unwrap();

        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 4);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let mut config = PipelineConfig::default();
        config.chunk_size = 1500;
        config.top_k = 6;

        save_config(temp.path(), &config).unwrap();

        let loaded = load_config(temp.path()).unwrap();
        assert_eq!(loaded.chunk_size, 1500);
        assert_eq!(loaded.top_k, 6);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let temp = TempDir::new().unwrap();
        let mut config = PipelineConfig::default();
        config.chunk_overlap = config.chunk_size + 1;

        save_config(temp.path(), &config).unwrap();

        assert!(load_config(temp.path()).is_err());
    }

    #[test]
    fn test_snapshot_path_is_under_passage_dir() {
        let path = get_snapshot_path(Path::new("/tmp/ws"));
        assert!(path.starts_with("/tmp/ws/.passage"));
        assert!(path.ends_with("index.sqlite"));
    }
}
