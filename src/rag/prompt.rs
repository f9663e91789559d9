// Prompt builder: retrieved context + question rendered into one of two templates
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::rag::store::RetrievedDocument;

/// Separator placed between document texts in the context block
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Answer style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Grounded answer citing specifics, admitting missing information
    #[default]
    Detailed,
    /// At most two sentences of facts, used for scoring against gold answers
    Concise,
}

impl PromptMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::Detailed => "detailed",
            PromptMode::Concise => "concise",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "detailed" => Ok(PromptMode::Detailed),
            "concise" => Ok(PromptMode::Concise),
            other => Err(format!("Unknown prompt mode: {}", other)),
        }
    }
}

/// Join document texts in received order
pub fn build_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .map(|d| d.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Render the prompt for `mode`
///
/// Question and context are inserted verbatim.
pub fn build_prompt(question: &str, documents: &[RetrievedDocument], mode: PromptMode) -> String {
    let context = build_context(documents);
    match mode {
        PromptMode::Detailed => format!(
            "You are a financial compliance assistant. Answer the question using ONLY the information from the context below.

Context:
{context}

Question: {question}

Instructions:
- Answer based only on the context provided
- Be specific and cite relevant details
- If the context doesn't contain the answer, say so

Answer:"
        ),
        PromptMode::Concise => format!(
            "Answer the question using ONLY the context below. Be brief and concise - list only the key facts without explanations.

Context:
{context}

Question: {question}

Brief answer (maximum 2 sentences):"
        ),
    }
}
