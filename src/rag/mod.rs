// Retrieval-augmented answering over the compliance corpus
//
// Components:
// - Store: vector store capability and retrieved documents
// - Retrieval Engine: primary top-k search with the generic fallback
// - Prompt: context assembly and the detailed / concise templates
// - Pipeline: retrieve -> prompt -> generate, with typed outcomes

pub mod store;
pub mod retrieval;
pub mod prompt;
pub mod pipeline;

// Re-export key types
pub use store::{RetrievedDocument, VectorStore};
pub use retrieval::{Retrieval, RetrievalEngine};
pub use prompt::{build_prompt, PromptMode};
pub use pipeline::{AnswerPipeline, AnswerRequest, AnswerResult};
