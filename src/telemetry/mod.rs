//! Side-band diagnostics for verbose answers
//!
//! The answer pipeline reports what it retrieved through a [`DiagnosticSink`].
//! Sinks never influence the returned answer.

use colored::Colorize;
use std::sync::{Arc, Mutex};

/// Maximum characters shown per document preview
pub const PREVIEW_CHARS: usize = 200;

/// Diagnostic event types
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Question being answered
    Query { question: String },
    /// Documents returned by a retrieval attempt
    Retrieved { count: usize },
    /// Primary retrieval was empty; widened query issued
    Fallback { query: String, top_k: usize },
    /// Score-annotated preview of one document (rank starts at 1)
    DocumentPreview {
        rank: usize,
        score: f64,
        preview: String,
    },
    /// Prompt handed to the generator
    Generating { prompt_chars: usize },
}

impl Diagnostic {
    /// Build a preview: first [`PREVIEW_CHARS`] characters, newlines flattened
    pub fn preview(rank: usize, score: f64, text: &str) -> Self {
        let preview: String = text
            .chars()
            .take(PREVIEW_CHARS)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        Diagnostic::DocumentPreview {
            rank,
            score,
            preview,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Diagnostic::Fallback { .. })
    }
}

/// Receiver of verbose diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, event: Diagnostic);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _event: Diagnostic) {}
}

/// Forwards diagnostics to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: Diagnostic) {
        match event {
            Diagnostic::Query { question } => tracing::info!(%question, "query"),
            Diagnostic::Retrieved { count } => tracing::info!(count, "retrieved documents"),
            Diagnostic::Fallback { query, top_k } => {
                tracing::info!(%query, top_k, "no results, trying broader search")
            }
            Diagnostic::DocumentPreview {
                rank,
                score,
                preview,
            } => tracing::info!(rank, score, %preview, "document"),
            Diagnostic::Generating { prompt_chars } => {
                tracing::info!(prompt_chars, "generating answer")
            }
        }
    }
}

/// Prints diagnostics to stderr for terminal users
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl DiagnosticSink for ConsoleSink {
    fn emit(&self, event: Diagnostic) {
        match event {
            Diagnostic::Query { question } => {
                eprintln!("\n{} '{}'", "Query:".cyan().bold(), question);
            }
            Diagnostic::Retrieved { count } => {
                eprintln!("{} {} documents", "Retrieved".cyan(), count);
            }
            Diagnostic::Fallback { query, .. } => {
                eprintln!(
                    "{} No results. Trying broader search ('{}')...",
                    "Warning:".yellow(),
                    query
                );
            }
            Diagnostic::DocumentPreview {
                rank,
                score,
                preview,
            } => {
                eprintln!("\n   {} (relevance: {:.3}):", format!("Doc {}", rank).bold(), score);
                eprintln!("   {}...", preview.dimmed());
            }
            Diagnostic::Generating { .. } => {
                eprintln!("\n{}", "Generating answer with LLM...".cyan());
            }
        }
    }
}

/// In-memory recorder, cheap to clone and share
#[derive(Clone)]
pub struct DiagnosticCollector {
    events: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of all recorded events
    pub fn events(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn event_count(&self) -> usize {
        self.lock().len()
    }

    /// Whether any recorded event is a fallback notice
    pub fn saw_fallback(&self) -> bool {
        self.lock().iter().any(Diagnostic::is_fallback)
    }

    /// Drain recorded events
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        // A poisoned recorder still holds valid events
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for DiagnosticCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn emit(&self, event: Diagnostic) {
        self.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_creation() {
        let collector = DiagnosticCollector::new();
        assert_eq!(collector.event_count(), 0);
        assert!(!collector.saw_fallback());
    }

    #[test]
    fn test_collector_records_in_order() {
        let collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::Retrieved { count: 0 });
        collector.emit(Diagnostic::Fallback {
            query: "financial compliance".to_string(),
            top_k: 5,
        });

        let events = collector.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Diagnostic::Retrieved { count: 0 });
        assert!(collector.saw_fallback());
    }

    #[test]
    fn test_clones_share_events() {
        let collector = DiagnosticCollector::new();
        let shared = collector.clone();
        shared.emit(Diagnostic::Retrieved { count: 3 });
        assert_eq!(collector.event_count(), 1);
    }

    #[test]
    fn test_take_drains() {
        let collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::Retrieved { count: 1 });
        assert_eq!(collector.take().len(), 1);
        assert_eq!(collector.event_count(), 0);
    }

    #[test]
    fn test_preview_truncates_and_flattens() {
        let text = format!("line one\nline two {}", "x".repeat(400));
        match Diagnostic::preview(1, 0.5, &text) {
            Diagnostic::DocumentPreview { preview, rank, .. } => {
                assert_eq!(rank, 1);
                assert_eq!(preview.chars().count(), PREVIEW_CHARS);
                assert!(preview.starts_with("line one line two"));
                assert!(!preview.contains('\n'));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_preview_handles_multibyte() {
        let text = "₹".repeat(300);
        match Diagnostic::preview(2, 0.1, &text) {
            Diagnostic::DocumentPreview { preview, .. } => {
                assert_eq!(preview.chars().count(), PREVIEW_CHARS);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
