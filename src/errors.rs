//! Error types for the compliance copilot
//!
//! Per-request outcomes (no documents, generation failures) are values of
//! [`crate::rag::AnswerResult`]; this enum covers input-contract violations
//! and initialization-time failures of the model-backed collaborators.

use thiserror::Error;

/// Main error type for the compliance copilot
#[derive(Error, Debug)]
pub enum CopilotError {
    /// Token and label sequences of different lengths
    #[error("Input contract violation: {tokens} tokens but {labels} labels")]
    InputContract { tokens: usize, labels: usize },

    /// Vector store could not be opened or queried
    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    /// Token classification model could not be loaded
    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Token classification failed for one input
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Generation backend failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Embedding model failures
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApi(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("Copilot error: {0}")]
    Generic(String),
}

/// Result type alias for copilot operations
pub type Result<T> = std::result::Result<T, CopilotError>;

/// Convert anyhow errors to CopilotError
impl From<anyhow::Error> for CopilotError {
    fn from(err: anyhow::Error) -> Self {
        CopilotError::Generic(format!("{:#}", err))
    }
}

impl CopilotError {
    /// Message without the variant prefix, for errors that wrap a plain message
    pub fn message(&self) -> String {
        match self {
            CopilotError::StoreUnavailable(msg)
            | CopilotError::ClassifierUnavailable(msg)
            | CopilotError::Classification(msg)
            | CopilotError::Generation(msg)
            | CopilotError::Embedding(msg)
            | CopilotError::OllamaApi(msg)
            | CopilotError::Config(msg)
            | CopilotError::Generic(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
