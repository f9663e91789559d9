// Vector store capability consumed by the retrieval orchestrator
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Retrieved document with its relevance score (higher = more relevant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub text: String,
    pub score: f64,
}

impl RetrievedDocument {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Similarity search over an indexed corpus
///
/// Results come back ranked by descending score; an empty vector means
/// nothing matched. Implementations are shared read-only across callers.
pub trait VectorStore: Send + Sync {
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedDocument>>;
}
