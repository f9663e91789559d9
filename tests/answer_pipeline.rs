//! Integration tests for the retrieval-augmented answer pipeline
//!
//! Runs without Ollama or downloaded models: the store, generator and
//! embedder are in-memory fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use compliance_copilot::index::{Embedder, IndexSettings, LocalVectorIndex};
use compliance_copilot::llm::Generator;
use compliance_copilot::rag::{
    build_prompt, AnswerPipeline, AnswerRequest, AnswerResult, PromptMode, RetrievedDocument,
    VectorStore,
};
use compliance_copilot::telemetry::{Diagnostic, DiagnosticCollector};
use compliance_copilot::{CopilotError, Result};
use tempfile::TempDir;

/// Returns `primary` for every query except the fallback one
struct ScriptedStore {
    primary: Vec<RetrievedDocument>,
    fallback: Vec<RetrievedDocument>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl ScriptedStore {
    fn new(primary: Vec<RetrievedDocument>, fallback: Vec<RetrievedDocument>) -> Self {
        Self {
            primary,
            fallback,
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

impl VectorStore for ScriptedStore {
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
        self.queries.lock().unwrap().push((text.to_string(), top_k));
        if text == "financial compliance" {
            Ok(self.fallback.clone())
        } else {
            Ok(self.primary.clone())
        }
    }
}

/// Counts calls and remembers the last prompt
struct CountingGenerator {
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
    fail_with: Option<String>,
}

impl CountingGenerator {
    fn replying() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            fail_with: None,
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::replying()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

impl Generator for CountingGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.fail_with {
            Some(message) => Err(CopilotError::Generation(message.clone())),
            None => Ok("Aadhaar card, PAN card and address proof.".to_string()),
        }
    }
}

fn doc(text: &str, score: f64) -> RetrievedDocument {
    RetrievedDocument::new(text, score)
}

fn pipeline(
    store: Arc<ScriptedStore>,
    generator: Arc<CountingGenerator>,
    collector: &DiagnosticCollector,
) -> AnswerPipeline {
    AnswerPipeline::new(store, generator).with_sink(Arc::new(collector.clone()))
}

#[test]
fn test_answer_from_primary_documents() {
    let store = Arc::new(ScriptedStore::new(
        vec![doc("KYC Policy: Aadhaar, PAN, address proof", 0.82)],
        vec![],
    ));
    let generator = Arc::new(CountingGenerator::replying());
    let collector = DiagnosticCollector::new();

    let result = pipeline(store.clone(), generator.clone(), &collector).answer(
        "What documents are required for KYC?",
        PromptMode::Detailed,
        false,
    );

    assert_eq!(
        result,
        AnswerResult::Answered {
            text: "Aadhaar card, PAN card and address proof.".to_string(),
            documents: 1,
            used_fallback: false,
        }
    );
    assert_eq!(store.queries(), vec![("What documents are required for KYC?".to_string(), 3)]);
    assert_eq!(generator.calls(), 1);
    assert_eq!(collector.event_count(), 0);
}

#[test]
fn test_fallback_documents_feed_the_prompt() {
    let store = Arc::new(ScriptedStore::new(
        vec![],
        vec![doc("AML Monitoring Rules: flag large transactions", 0.4)],
    ));
    let generator = Arc::new(CountingGenerator::replying());
    let collector = DiagnosticCollector::new();

    let result = pipeline(store.clone(), generator.clone(), &collector).answer(
        "What is the SWIFT code policy?",
        PromptMode::Detailed,
        true,
    );

    assert!(matches!(result, AnswerResult::Answered { used_fallback: true, .. }));
    assert_eq!(store.queries()[1], ("financial compliance".to_string(), 5));
    assert!(generator
        .last_prompt()
        .unwrap()
        .contains("AML Monitoring Rules: flag large transactions"));
    assert!(collector.saw_fallback());
}

#[test]
fn test_no_documents_skips_generation() {
    let store = Arc::new(ScriptedStore::new(vec![], vec![]));
    let generator = Arc::new(CountingGenerator::replying());
    let collector = DiagnosticCollector::new();

    let result = pipeline(store.clone(), generator.clone(), &collector).answer(
        "Anything?",
        PromptMode::Concise,
        true,
    );

    assert_eq!(result, AnswerResult::NoDocuments);
    assert_eq!(generator.calls(), 0);
    assert_eq!(store.queries().len(), 2);
    assert!(result.to_string().contains("No documents found"));
}

#[test]
fn test_generation_failure_carries_message() {
    let store = Arc::new(ScriptedStore::new(vec![doc("KYC Policy", 0.9)], vec![]));
    let generator = Arc::new(CountingGenerator::failing("connection refused"));
    let collector = DiagnosticCollector::new();

    let result = pipeline(store, generator, &collector).answer(
        "What is KYC?",
        PromptMode::Detailed,
        false,
    );

    assert_eq!(
        result,
        AnswerResult::GenerationError {
            message: "connection refused".to_string()
        }
    );
    assert_eq!(result.text(), None);
}

#[test]
fn test_verbose_previews_top_three() {
    let long_text = format!("{}\n{}", "a".repeat(150), "b".repeat(150));
    let store = Arc::new(ScriptedStore::new(
        vec![
            doc(&long_text, 0.9),
            doc("second", 0.8),
            doc("third", 0.7),
            doc("fourth", 0.6),
        ],
        vec![],
    ));
    let generator = Arc::new(CountingGenerator::replying());
    let collector = DiagnosticCollector::new();

    let verbose = pipeline(store.clone(), generator.clone(), &collector).answer(
        "q",
        PromptMode::Detailed,
        true,
    );
    let quiet = pipeline(store, generator, &DiagnosticCollector::new()).answer(
        "q",
        PromptMode::Detailed,
        false,
    );
    assert_eq!(verbose, quiet);

    let previews: Vec<Diagnostic> = collector
        .events()
        .into_iter()
        .filter(|e| matches!(e, Diagnostic::DocumentPreview { .. }))
        .collect();
    assert_eq!(previews.len(), 3);
    match &previews[0] {
        Diagnostic::DocumentPreview { rank, preview, .. } => {
            assert_eq!(*rank, 1);
            assert_eq!(preview.chars().count(), 200);
            assert!(!preview.contains('\n'));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_concise_kyc_prompt() {
    let question = "What documents are required for KYC?";
    let prompt = build_prompt(question, &[doc("KYC Policy", 0.9)], PromptMode::Concise);

    assert!(prompt.contains("maximum 2 sentences"));
    assert!(prompt.contains(question));
}

#[test]
fn test_request_modes() {
    let store = Arc::new(ScriptedStore::new(vec![doc("KYC Policy", 0.9)], vec![]));
    let generator = Arc::new(CountingGenerator::replying());
    let collector = DiagnosticCollector::new();
    let pipeline = pipeline(store, generator.clone(), &collector);

    pipeline.handle(&AnswerRequest::new("What is KYC?").concise());
    assert!(generator.last_prompt().unwrap().contains("maximum 2 sentences"));

    pipeline.handle(&AnswerRequest::new("What is KYC?"));
    assert!(!generator.last_prompt().unwrap().contains("maximum 2 sentences"));
}

/// Keyword-count embedder standing in for the sentence model
struct KeywordEmbedder;

const KEYWORDS: &[&str] = &["kyc", "aml", "transaction", "document", "compliance"];

impl Embedder for KeywordEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                KEYWORDS.iter().map(|k| lower.matches(k).count() as f32).collect()
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        KEYWORDS.len()
    }
}

#[test]
fn test_pipeline_over_persisted_index() {
    let temp_dir = TempDir::new().unwrap();
    let mut index = LocalVectorIndex::new(IndexSettings::default(), Arc::new(KeywordEmbedder)).unwrap();
    index
        .add("kyc_policy.txt", "KYC Policy. Required documents: Aadhaar, PAN.")
        .unwrap();
    index
        .add("aml_rules.txt", "AML Monitoring Rules. Flag any transaction above 10 lakh.")
        .unwrap();
    index.persist(temp_dir.path()).unwrap();

    let reopened =
        LocalVectorIndex::open(temp_dir.path(), IndexSettings::default(), Arc::new(KeywordEmbedder))
            .unwrap();
    let generator = Arc::new(CountingGenerator::replying());
    let pipeline = AnswerPipeline::new(Arc::new(reopened), generator.clone());

    let result = pipeline.answer("Which KYC documents?", PromptMode::Detailed, false);
    assert!(result.is_answered());

    let prompt = generator.last_prompt().unwrap();
    let kyc = prompt.find("KYC Policy").unwrap();
    let aml = prompt.find("AML Monitoring").unwrap();
    assert!(kyc < aml);
}
