//! Configuration management for Compliance Copilot
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.compliance-copilot/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{CopilotError, Result};
use crate::index::settings::{IndexSettings, DEFAULT_EMBEDDING_MODEL};
use crate::llm::client::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};
use crate::rag::retrieval::DEFAULT_TOP_K;

/// Complete configuration for Compliance Copilot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ollama: OllamaConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub ner: NerConfig,
}

/// Ollama connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub temperature: f64,
    pub timeout_secs: u64,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub index_dir: String,
    pub docs_dir: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NerConfig {
    pub model_dir: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: "indexes/simple_index".to_string(),
            docs_dir: "data/docs".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: 256,
            chunk_overlap: 20,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K }
    }
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            model_dir: "models/ner_financial/final".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CopilotError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| CopilotError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// `~/.compliance-copilot/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".compliance-copilot").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(CopilotError::Config(
                "top_k must be greater than 0".to_string()
            ));
        }

        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(CopilotError::Config(
                format!("temperature must be between 0.0 and 2.0, got {}", self.ollama.temperature)
            ));
        }

        self.index_settings().validate()
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CopilotError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CopilotError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CopilotError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    pub fn ollama_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.timeout_secs)
    }

    /// Settings passed to the index at construction time
    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            embedding_model: self.index.embedding_model.clone(),
            chunk_size: self.index.chunk_size,
            chunk_overlap: self.index.chunk_overlap,
        }
    }

    pub fn index_dir(&self) -> PathBuf {
        Self::expand_path(&self.index.index_dir)
    }

    pub fn docs_dir(&self) -> PathBuf {
        Self::expand_path(&self.index.docs_dir)
    }

    pub fn ner_model_dir(&self) -> PathBuf {
        Self::expand_path(&self.ner.model_dir)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }
}
