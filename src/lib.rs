//! Compliance Copilot - financial compliance assistant
//!
//! Answers compliance questions with retrieval-augmented generation over a
//! local document index and extracts financial entities with a fine-tuned
//! token classifier.
//!
//! # Architecture
//!
//! - **ner**: BIO label grouping and the token classifier
//! - **rag**: retrieval with fallback, prompt templates, answer pipeline
//! - **index**: chunking, embeddings and the persisted vector index
//! - **llm**: Ollama generation backend
//! - **telemetry**: verbose diagnostics side channel
//! - **evaluate**: concise answers against gold question/answer pairs

pub mod errors;
pub mod ner;
pub mod rag;
pub mod index;
pub mod llm;
pub mod telemetry;
pub mod evaluate;

// Re-export commonly used types
pub use errors::{CopilotError, Result};

// Command-line front end
pub mod cli;
pub mod doctor;
pub mod repl;
