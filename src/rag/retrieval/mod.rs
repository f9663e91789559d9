// Retrieval Engine Module
pub mod engine;

pub use engine::{Retrieval, RetrievalEngine, DEFAULT_TOP_K, FALLBACK_QUERY, FALLBACK_TOP_K};
