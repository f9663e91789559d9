//! Named-entity recognition for financial text
//!
//! Components:
//! - Label: BIO label parsing
//! - Grouping: per-token labels to typed entity spans
//! - Classifier: token classification capability and its BERT backend
//! - Extractor: whitespace tokenization + classification + grouping

pub mod label;
pub mod grouping;
pub mod classifier;
pub mod extractor;

pub use label::Label;
pub use grouping::{extract, group, EntitySpan, TokenEntity};
pub use classifier::{Classifier, TokenClassifier};
pub use extractor::FinancialNer;
