//! Text-level entity extraction

use std::sync::Arc;

use crate::errors::{CopilotError, Result};
use crate::ner::classifier::Classifier;
use crate::ner::grouping::{self, EntitySpan, TokenEntity};

/// Financial entity extractor over any [`Classifier`]
pub struct FinancialNer {
    classifier: Arc<dyn Classifier>,
}

impl FinancialNer {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    /// Per-token entities, no merging
    pub fn extract(&self, text: &str) -> Result<Vec<TokenEntity>> {
        let (tokens, labels) = self.label(text)?;
        grouping::extract(&tokens, &labels)
    }

    /// Entities grouped into typed spans
    pub fn extract_grouped(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let (tokens, labels) = self.label(text)?;
        grouping::group(&tokens, &labels)
    }

    fn label(&self, text: &str) -> Result<(Vec<String>, Vec<String>)> {
        let tokens: Vec<String> = text.split_whitespace().map(String::from).collect();
        let labels = self.classifier.classify(&tokens)?;

        if labels.len() != tokens.len() {
            return Err(CopilotError::InputContract {
                tokens: tokens.len(),
                labels: labels.len(),
            });
        }

        tracing::debug!(tokens = tokens.len(), "classified tokens");
        Ok((tokens, labels))
    }
}
