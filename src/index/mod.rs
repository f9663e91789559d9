//! Vector index construction and search
//!
//! Components:
//! - Settings: embedding model and chunking parameters
//! - Chunker: overlapping word windows
//! - Embedding: sentence embeddings via Candle
//! - Store: cosine-similarity index persisted as JSON
//! - Ingest: documents directory -> persisted index

pub mod settings;
pub mod chunker;
pub mod embedding;
pub mod store;
pub mod ingest;

pub use settings::IndexSettings;
pub use chunker::Chunker;
pub use embedding::{Embedder, EmbeddingEngine};
pub use store::{IndexSummary, LocalVectorIndex};
pub use ingest::{build_index, ingest, load_documents, smoke_test, SourceDocument};
