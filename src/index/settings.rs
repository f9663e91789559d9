// Index construction settings, passed explicitly to every index constructor
use serde::{Deserialize, Serialize};

use crate::errors::{CopilotError, Result};

/// Default sentence-embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding and chunking settings for one index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSettings {
    /// Hugging Face repository of the embedding model
    pub embedding_model: String,
    /// Words per chunk
    pub chunk_size: usize,
    /// Words shared by adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chunk_size: 256,
            chunk_overlap: 20,
        }
    }
}

impl IndexSettings {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CopilotError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(CopilotError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(CopilotError::Config(
                "embedding_model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
