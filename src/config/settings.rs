//! Configuration settings for the Tabula server.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub datasets: DatasetsConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("config.toml"),
            PathBuf::from("tabula.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("tabula/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.backend.base_url.is_empty() {
            return Err(ConfigError::MissingField("backend.base_url".to_string()).into());
        }
        if self.backend.model.is_empty() {
            return Err(ConfigError::MissingField("backend.model".to_string()).into());
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid("backend.timeout_secs must be > 0".to_string()).into());
        }
        if self.dataset_preview_rows() == 0 {
            return Err(
                ConfigError::Invalid("pipeline.preview_rows must be > 0".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Expand the dataset directory path.
    pub fn datasets_dir(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.datasets.data_dir);
        PathBuf::from(expanded.as_ref())
    }

    /// Number of rows included in the prompt preview.
    pub fn dataset_preview_rows(&self) -> usize {
        self.pipeline.preview_rows
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// HTTP port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Text-generation backend configuration (OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL for the chat-completions API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key (read from OPENAI_API_KEY at call time if not set).
    pub api_key: Option<String>,
    /// Request timeout in seconds, applied independently to every call.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Dataset preload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetsConfig {
    /// Directory scanned for `*.csv` files at startup.
    pub data_dir: String,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            data_dir: "./datasets".to_string(),
        }
    }
}

/// Query pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Whether to ask the backend for a chart suggestion.
    pub suggest_charts: bool,
    /// Rows of the target table shown to the backend for grounding.
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            suggest_charts: true,
            preview_rows: 5,
        }
    }
}
