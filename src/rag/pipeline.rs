// End-to-end answer pipeline: retrieve -> build prompt -> generate
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::llm::Generator;
use crate::rag::prompt::{build_prompt, PromptMode};
use crate::rag::retrieval::{Retrieval, RetrievalEngine};
use crate::rag::store::VectorStore;
use crate::telemetry::{Diagnostic, DiagnosticSink, NullSink};

/// Documents shown in verbose previews
const MAX_PREVIEWS: usize = 3;

/// One question to answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
    #[serde(default)]
    pub mode: PromptMode,
    #[serde(default)]
    pub verbose: bool,
}

impl AnswerRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            mode: PromptMode::Detailed,
            verbose: false,
        }
    }

    pub fn concise(mut self) -> Self {
        self.mode = PromptMode::Concise;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Outcome of answering one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerResult {
    /// Generated text, returned verbatim
    Answered {
        text: String,
        documents: usize,
        used_fallback: bool,
    },
    /// Primary and fallback retrieval both came back empty
    NoDocuments,
    /// Generator failed
    GenerationError { message: String },
    /// Vector store failed while querying
    RetrievalError { message: String },
}

impl AnswerResult {
    /// Generated text for successful answers
    pub fn text(&self) -> Option<&str> {
        match self {
            AnswerResult::Answered { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerResult::Answered { .. })
    }

    /// Documents the answer was grounded on
    pub fn documents(&self) -> usize {
        match self {
            AnswerResult::Answered { documents, .. } => *documents,
            _ => 0,
        }
    }
}

impl fmt::Display for AnswerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerResult::Answered { text, .. } => f.write_str(text),
            AnswerResult::NoDocuments => {
                write!(f, "No documents found in index. The index may be empty.")
            }
            AnswerResult::GenerationError { message } => {
                write!(f, "Error generating response: {}", message)
            }
            AnswerResult::RetrievalError { message } => {
                write!(f, "Error retrieving documents: {}", message)
            }
        }
    }
}

/// Pipeline stages, logged as they are entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Retrieving,
    EmptyTerminal,
    Building,
    Generating,
    Success,
    GenerationError,
}

/// Retrieval-augmented answer pipeline
///
/// Holds only shared read-only handles, so one pipeline can serve many
/// callers; each call runs to completion on the calling thread.
pub struct AnswerPipeline {
    retrieval: RetrievalEngine,
    generator: Arc<dyn Generator>,
    sink: Arc<dyn DiagnosticSink>,
}

impl AnswerPipeline {
    /// Create pipeline with default top-k and no diagnostics output
    pub fn new(store: Arc<dyn VectorStore>, generator: Arc<dyn Generator>) -> Self {
        Self {
            retrieval: RetrievalEngine::new(store),
            generator,
            sink: Arc::new(NullSink),
        }
    }

    /// Create pipeline around an existing retrieval engine
    pub fn with_retrieval(retrieval: RetrievalEngine, generator: Arc<dyn Generator>) -> Self {
        Self {
            retrieval,
            generator,
            sink: Arc::new(NullSink),
        }
    }

    /// Route verbose diagnostics to `sink`
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Answer a request
    pub fn handle(&self, request: &AnswerRequest) -> AnswerResult {
        self.answer(&request.question, request.mode, request.verbose)
    }

    /// Answer `question` in `mode`; `verbose` enables side-band diagnostics
    pub fn answer(&self, question: &str, mode: PromptMode, verbose: bool) -> AnswerResult {
        let report = |event: Diagnostic| {
            if verbose {
                self.sink.emit(event);
            }
        };

        report(Diagnostic::Query {
            question: question.to_string(),
        });

        enter(Stage::Retrieving);
        let retrieval = self
            .retrieval
            .retrieve_reporting(question, self.retrieval.top_k(), &report);
        let retrieval = match retrieval {
            Ok(retrieval) => retrieval,
            Err(e) => {
                return AnswerResult::RetrievalError {
                    message: e.to_string(),
                }
            }
        };

        let used_fallback = retrieval.used_fallback();
        let documents = match retrieval {
            Retrieval::Empty => {
                enter(Stage::EmptyTerminal);
                return AnswerResult::NoDocuments;
            }
            other => other.into_documents(),
        };

        for (idx, doc) in documents.iter().take(MAX_PREVIEWS).enumerate() {
            report(Diagnostic::preview(idx + 1, doc.score, &doc.text));
        }

        enter(Stage::Building);
        let prompt = build_prompt(question, &documents, mode);

        enter(Stage::Generating);
        report(Diagnostic::Generating {
            prompt_chars: prompt.chars().count(),
        });

        match self.generator.generate(&prompt) {
            Ok(text) => {
                enter(Stage::Success);
                AnswerResult::Answered {
                    text,
                    documents: documents.len(),
                    used_fallback,
                }
            }
            Err(e) => {
                enter(Stage::GenerationError);
                tracing::error!(error = %e, "generation failed");
                AnswerResult::GenerationError {
                    message: e.message(),
                }
            }
        }
    }

    pub fn retrieval(&self) -> &RetrievalEngine {
        &self.retrieval
    }
}

fn enter(stage: Stage) {
    tracing::debug!(stage = ?stage, "answer pipeline");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CopilotError, Result};
    use crate::rag::store::RetrievedDocument;
    use crate::telemetry::DiagnosticCollector;
    use std::sync::Mutex;

    use crate::rag::retrieval::FALLBACK_QUERY;

    struct FixedStore {
        primary: Vec<RetrievedDocument>,
        fallback: Vec<RetrievedDocument>,
    }

    impl VectorStore for FixedStore {
        fn query(&self, text: &str, _top_k: usize) -> Result<Vec<RetrievedDocument>> {
            if text == FALLBACK_QUERY {
                Ok(self.fallback.clone())
            } else {
                Ok(self.primary.clone())
            }
        }
    }

    struct BrokenStore;

    impl VectorStore for BrokenStore {
        fn query(&self, _text: &str, _top_k: usize) -> Result<Vec<RetrievedDocument>> {
            Err(CopilotError::StoreUnavailable("index file truncated".to_string()))
        }
    }

    /// Records prompts and replies with a canned answer
    struct EchoGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl EchoGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Generator for EchoGenerator {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingGenerator;

    impl Generator for FailingGenerator {
        fn generate(&self, _prompt: &str) -> Result<String> {
            Err(CopilotError::Generation("model 'llama3.2' not found".to_string()))
        }
    }

    fn store(primary: &[&str], fallback: &[&str]) -> Arc<FixedStore> {
        let docs = |texts: &[&str]| -> Vec<RetrievedDocument> {
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| RetrievedDocument::new(*t, 0.9 - i as f64 * 0.1))
                .collect()
        };
        Arc::new(FixedStore {
            primary: docs(primary),
            fallback: docs(fallback),
        })
    }

    #[test]
    fn test_answer_from_primary_documents() {
        let generator = Arc::new(EchoGenerator::new("  PAN, address proof, photo.\n"));
        let pipeline = AnswerPipeline::new(store(&["KYC Policy"], &[]), generator.clone());

        let result = pipeline.answer("What is KYC?", PromptMode::Detailed, false);
        assert_eq!(result.text(), Some("  PAN, address proof, photo.\n"));
        assert_eq!(result.documents(), 1);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("KYC Policy"));
    }

    #[test]
    fn test_fallback_documents_used() {
        let generator = Arc::new(EchoGenerator::new("Flag large transactions."));
        let collector = DiagnosticCollector::new();
        let pipeline = AnswerPipeline::new(store(&[], &["AML Monitoring Rules"]), generator.clone())
            .with_sink(Arc::new(collector.clone()));

        let result = pipeline.answer("Unknown topic?", PromptMode::Concise, true);
        assert!(matches!(
            result,
            AnswerResult::Answered { used_fallback: true, documents: 1, .. }
        ));
        assert!(collector.saw_fallback());
        assert!(generator.prompts.lock().unwrap()[0].contains("AML Monitoring Rules"));
    }

    #[test]
    fn test_no_documents_skips_generation() {
        let generator = Arc::new(EchoGenerator::new("unused"));
        let pipeline = AnswerPipeline::new(store(&[], &[]), generator.clone());

        let result = pipeline.answer("Anything?", PromptMode::Detailed, false);
        assert_eq!(result, AnswerResult::NoDocuments);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_generation_error_is_wrapped() {
        let pipeline = AnswerPipeline::new(store(&["KYC Policy"], &[]), Arc::new(FailingGenerator));

        let result = pipeline.answer("What is KYC?", PromptMode::Detailed, false);
        assert_eq!(
            result,
            AnswerResult::GenerationError {
                message: "model 'llama3.2' not found".to_string()
            }
        );
        assert!(result.to_string().contains("model 'llama3.2' not found"));
    }

    #[test]
    fn test_store_failure_is_wrapped() {
        let generator = Arc::new(EchoGenerator::new("unused"));
        let pipeline = AnswerPipeline::new(Arc::new(BrokenStore), generator.clone());

        let result = pipeline.answer("What is KYC?", PromptMode::Detailed, true);
        match result {
            AnswerResult::RetrievalError { message } => {
                assert!(message.contains("index file truncated"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_verbose_reports_previews_for_top_three() {
        let collector = DiagnosticCollector::new();
        let pipeline = AnswerPipeline::new(
            store(&["a", "b", "c", "d"], &[]),
            Arc::new(EchoGenerator::new("ok")),
        )
        .with_sink(Arc::new(collector.clone()));

        pipeline.answer("q", PromptMode::Detailed, true);
        let events = collector.events();
        assert_eq!(
            events[0],
            Diagnostic::Query {
                question: "q".to_string()
            }
        );
        assert!(events.contains(&Diagnostic::Retrieved { count: 4 }));
        let previews = events
            .iter()
            .filter(|e| matches!(e, Diagnostic::DocumentPreview { .. }))
            .count();
        assert_eq!(previews, 3);
        assert!(!collector.saw_fallback());
    }

    #[test]
    fn test_quiet_mode_emits_nothing() {
        let collector = DiagnosticCollector::new();
        let pipeline = AnswerPipeline::new(store(&[], &["fallback doc"]), Arc::new(EchoGenerator::new("ok")))
            .with_sink(Arc::new(collector.clone()));

        let quiet = pipeline.answer("q", PromptMode::Detailed, false);
        assert_eq!(collector.event_count(), 0);

        let loud = pipeline.answer("q", PromptMode::Detailed, true);
        assert_eq!(quiet, loud);
    }

    #[test]
    fn test_handle_request() {
        let generator = Arc::new(EchoGenerator::new("Two facts."));
        let pipeline = AnswerPipeline::new(store(&["KYC Policy"], &[]), generator.clone());

        let request = AnswerRequest::new("What documents are required for KYC?").concise();
        let result = pipeline.handle(&request);
        assert!(result.is_answered());
        assert!(generator.prompts.lock().unwrap()[0].contains("maximum 2 sentences"));
    }

    #[test]
    fn test_result_display() {
        assert!(AnswerResult::NoDocuments
            .to_string()
            .contains("No documents found"));
        let json = serde_json::to_value(&AnswerResult::NoDocuments).unwrap();
        assert_eq!(json["status"], "no_documents");
    }
}
