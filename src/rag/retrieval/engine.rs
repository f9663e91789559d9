// Retrieval orchestrator: primary top-k search with a widened fallback
use std::sync::Arc;

use crate::errors::Result;
use crate::rag::store::{RetrievedDocument, VectorStore};
use crate::telemetry::Diagnostic;

/// Default number of documents for the primary query
pub const DEFAULT_TOP_K: usize = 3;

/// Generic query issued when the primary query finds nothing.
///
/// The fallback does not retry the caller's question: it asks the store for
/// broad compliance material instead, so the answer may be grounded in
/// documents unrelated to the question.
pub const FALLBACK_QUERY: &str = "financial compliance";

/// Number of documents requested by the fallback query
pub const FALLBACK_TOP_K: usize = 5;

/// Outcome of a retrieval
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// Primary query returned documents
    Primary(Vec<RetrievedDocument>),
    /// Primary query was empty, fallback query returned documents
    Fallback(Vec<RetrievedDocument>),
    /// Both queries were empty
    Empty,
}

impl Retrieval {
    /// Documents held by this outcome, empty for [`Retrieval::Empty`]
    pub fn documents(&self) -> &[RetrievedDocument] {
        match self {
            Retrieval::Primary(docs) | Retrieval::Fallback(docs) => docs,
            Retrieval::Empty => &[],
        }
    }

    pub fn into_documents(self) -> Vec<RetrievedDocument> {
        match self {
            Retrieval::Primary(docs) | Retrieval::Fallback(docs) => docs,
            Retrieval::Empty => Vec::new(),
        }
    }

    pub fn used_fallback(&self) -> bool {
        matches!(self, Retrieval::Fallback(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Retrieval::Empty)
    }
}

/// Retrieval orchestrator wrapping a vector store
#[derive(Clone)]
pub struct RetrievalEngine {
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl RetrievalEngine {
    /// Create with the default top-k
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self::with_top_k(store, DEFAULT_TOP_K)
    }

    pub fn with_top_k(store: Arc<dyn VectorStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    /// Retrieve with the configured top-k
    pub fn retrieve(&self, query: &str) -> Result<Retrieval> {
        self.retrieve_with_top_k(query, self.top_k)
    }

    /// Primary query, then one fallback query if the primary is empty
    pub fn retrieve_with_top_k(&self, query: &str, top_k: usize) -> Result<Retrieval> {
        self.retrieve_reporting(query, top_k, &|_| {})
    }

    /// Like [`retrieve_with_top_k`](Self::retrieve_with_top_k), passing each
    /// retrieval step to `report`
    pub fn retrieve_reporting(
        &self,
        query: &str,
        top_k: usize,
        report: &dyn Fn(Diagnostic),
    ) -> Result<Retrieval> {
        let primary = self.primary(query, top_k)?;
        report(Diagnostic::Retrieved {
            count: primary.len(),
        });
        if !primary.is_empty() {
            return Ok(Retrieval::Primary(primary));
        }

        report(Diagnostic::Fallback {
            query: FALLBACK_QUERY.to_string(),
            top_k: FALLBACK_TOP_K,
        });
        let fallback = self.fallback()?;
        if let Retrieval::Fallback(docs) = &fallback {
            report(Diagnostic::Retrieved { count: docs.len() });
        }
        Ok(fallback)
    }

    /// Run only the primary query
    pub fn primary(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
        self.store.query(query, top_k)
    }

    /// Run only the fallback query
    pub fn fallback(&self) -> Result<Retrieval> {
        tracing::warn!(
            fallback = FALLBACK_QUERY,
            top_k = FALLBACK_TOP_K,
            "no results, trying broader search"
        );
        let fallback = self.store.query(FALLBACK_QUERY, FALLBACK_TOP_K)?;
        if fallback.is_empty() {
            tracing::warn!("fallback search returned no documents, index may be empty");
            return Ok(Retrieval::Empty);
        }
        Ok(Retrieval::Fallback(fallback))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn set_top_k(&mut self, top_k: usize) {
        self.top_k = top_k;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers only the queries it was seeded with and logs every call
    struct ScriptedStore {
        answers: Vec<(&'static str, Vec<RetrievedDocument>)>,
        calls: Mutex<Vec<(String, usize)>>,
    }

    impl ScriptedStore {
        fn new(answers: Vec<(&'static str, Vec<RetrievedDocument>)>) -> Self {
            Self {
                answers,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, usize)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl VectorStore for ScriptedStore {
        fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
            self.calls.lock().unwrap().push((text.to_string(), top_k));
            Ok(self
                .answers
                .iter()
                .find(|(q, _)| *q == text)
                .map(|(_, docs)| docs.clone())
                .unwrap_or_default())
        }
    }

    fn doc(text: &str, score: f64) -> RetrievedDocument {
        RetrievedDocument::new(text, score)
    }

    #[test]
    fn test_primary_hit_skips_fallback() {
        let store = Arc::new(ScriptedStore::new(vec![(
            "KYC documents",
            vec![doc("KYC Policy", 0.9)],
        )]));
        let engine = RetrievalEngine::new(store.clone());

        let retrieval = engine.retrieve("KYC documents").unwrap();
        assert!(!retrieval.used_fallback());
        assert_eq!(retrieval.documents().len(), 1);
        assert_eq!(store.calls(), vec![("KYC documents".to_string(), DEFAULT_TOP_K)]);
    }

    #[test]
    fn test_fallback_uses_generic_query() {
        let store = Arc::new(ScriptedStore::new(vec![(
            FALLBACK_QUERY,
            vec![doc("AML Monitoring Rules", 0.4), doc("KYC Policy", 0.3)],
        )]));
        let engine = RetrievalEngine::with_top_k(store.clone(), 2);

        let retrieval = engine.retrieve("unrelated question").unwrap();
        assert!(retrieval.used_fallback());
        assert_eq!(retrieval.documents().len(), 2);
        assert_eq!(
            store.calls(),
            vec![
                ("unrelated question".to_string(), 2),
                (FALLBACK_QUERY.to_string(), FALLBACK_TOP_K),
            ]
        );
    }

    #[test]
    fn test_both_empty() {
        let store = Arc::new(ScriptedStore::new(Vec::new()));
        let engine = RetrievalEngine::new(store.clone());

        let retrieval = engine.retrieve("anything").unwrap();
        assert!(retrieval.is_empty());
        assert!(retrieval.documents().is_empty());
        assert_eq!(store.calls().len(), 2);
    }

    #[test]
    fn test_documents_kept_in_store_order() {
        let store = Arc::new(ScriptedStore::new(vec![(
            "q",
            vec![doc("a", 0.2), doc("b", 0.9)],
        )]));
        let docs = RetrievalEngine::new(store).retrieve("q").unwrap().into_documents();
        assert_eq!(docs[0].text, "a");
        assert_eq!(docs[1].text, "b");
    }

    #[test]
    fn test_reports_each_step() {
        let store = Arc::new(ScriptedStore::new(vec![(
            FALLBACK_QUERY,
            vec![doc("AML Monitoring Rules", 0.4)],
        )]));
        let engine = RetrievalEngine::new(store);
        let events = Mutex::new(Vec::new());

        let retrieval = engine
            .retrieve_reporting("unrelated question", 3, &|e| events.lock().unwrap().push(e))
            .unwrap();
        assert!(retrieval.used_fallback());
        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Diagnostic::Retrieved { count: 0 },
                Diagnostic::Fallback {
                    query: FALLBACK_QUERY.to_string(),
                    top_k: FALLBACK_TOP_K,
                },
                Diagnostic::Retrieved { count: 1 },
            ]
        );
    }

    #[test]
    fn test_set_top_k() {
        let mut engine = RetrievalEngine::new(Arc::new(ScriptedStore::new(Vec::new())));
        assert_eq!(engine.top_k(), DEFAULT_TOP_K);
        engine.set_top_k(7);
        assert_eq!(engine.top_k(), 7);
    }
}
