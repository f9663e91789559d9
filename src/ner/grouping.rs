//! Entity grouping engine
//!
//! Turns per-token BIO predictions into typed entity spans in a single
//! left-to-right pass with no lookahead.

use serde::{Deserialize, Serialize};

use crate::errors::{CopilotError, Result};
use crate::ner::label::Label;

/// A maximal run of consecutive tokens sharing one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Constituent tokens joined by single spaces
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub tokens: Vec<String>,
}

impl EntitySpan {
    fn open(token: &str, entity_type: &str) -> Self {
        Self {
            text: token.to_string(),
            entity_type: entity_type.to_string(),
            tokens: vec![token.to_string()],
        }
    }

    fn extend(&mut self, token: &str) {
        self.text.push(' ');
        self.text.push_str(token);
        self.tokens.push(token.to_string());
    }
}

/// One non-`O` token with its raw label, no merging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntity {
    pub token: String,
    pub label: String,
}

fn check_lengths<T, L>(tokens: &[T], labels: &[L]) -> Result<()> {
    if tokens.len() != labels.len() {
        return Err(CopilotError::InputContract {
            tokens: tokens.len(),
            labels: labels.len(),
        });
    }
    Ok(())
}

/// Group (token, label) pairs into entity spans
///
/// An `I-TYPE` with no open span, or following a span of another type,
/// opens a new span instead of being dropped.
pub fn group<T, L>(tokens: &[T], labels: &[L]) -> Result<Vec<EntitySpan>>
where
    T: AsRef<str>,
    L: AsRef<str>,
{
    check_lengths(tokens, labels)?;

    let mut spans = Vec::new();
    let mut current: Option<EntitySpan> = None;

    for (token, raw) in tokens.iter().zip(labels) {
        let token = token.as_ref();
        let label = Label::parse(raw.as_ref());

        let entity_type = match label.entity_type() {
            Some(t) => t,
            None => {
                spans.extend(current.take());
                continue;
            }
        };

        match current.as_mut() {
            Some(span) if !label.is_begin() && span.entity_type == entity_type => {
                span.extend(token);
            }
            _ => {
                spans.extend(current.take());
                current = Some(EntitySpan::open(token, entity_type));
            }
        }
    }

    spans.extend(current);
    Ok(spans)
}

/// One record per non-`O` token, without grouping
pub fn extract<T, L>(tokens: &[T], labels: &[L]) -> Result<Vec<TokenEntity>>
where
    T: AsRef<str>,
    L: AsRef<str>,
{
    check_lengths(tokens, labels)?;

    Ok(tokens
        .iter()
        .zip(labels)
        .filter(|(_, label)| Label::parse(label.as_ref()) != Label::Outside)
        .map(|(token, label)| TokenEntity {
            token: token.as_ref().to_string(),
            label: label.as_ref().to_string(),
        })
        .collect())
}
