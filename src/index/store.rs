// Local vector index: cosine search over embedded chunks, persisted as JSON
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{CopilotError, Result};
use crate::index::chunker::Chunker;
use crate::index::embedding::Embedder;
use crate::index::settings::IndexSettings;
use crate::rag::store::{RetrievedDocument, VectorStore};

/// File name of the persisted index inside the index directory
pub const INDEX_FILE: &str = "index.json";

/// Chunks embedded per batch
const EMBED_BATCH: usize = 16;

/// One embedded chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: Uuid,
    /// Originating file name
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    settings: IndexSettings,
    dimension: usize,
    built_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

/// Metadata of a persisted index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSummary {
    pub path: PathBuf,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunks: usize,
    pub built_at: DateTime<Utc>,
}

/// Query result with its originating chunk
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub entry: &'a IndexEntry,
    pub score: f64,
}

/// In-memory vector index
pub struct LocalVectorIndex {
    settings: IndexSettings,
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    entries: Vec<IndexEntry>,
    built_at: DateTime<Utc>,
}

impl LocalVectorIndex {
    /// Create an empty index
    pub fn new(settings: IndexSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let chunker = Chunker::new(&settings)?;
        Ok(Self {
            settings,
            chunker,
            embedder,
            entries: Vec::new(),
            built_at: Utc::now(),
        })
    }

    /// Load a persisted index from `index_dir`
    ///
    /// The persisted embedding model must match `settings`, since query
    /// vectors are produced by `embedder`.
    pub fn open(
        index_dir: impl AsRef<Path>,
        settings: IndexSettings,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let path = index_dir.as_ref().join(INDEX_FILE);
        let file = read_index_file(&path)?;

        if file.settings.embedding_model != settings.embedding_model {
            return Err(CopilotError::StoreUnavailable(format!(
                "index was built with {} but {} is configured; rebuild the index",
                file.settings.embedding_model, settings.embedding_model
            )));
        }
        if file.dimension != embedder.dimension() {
            return Err(CopilotError::StoreUnavailable(format!(
                "index dimension {} does not match embedder dimension {}",
                file.dimension,
                embedder.dimension()
            )));
        }

        let index = Self {
            chunker: Chunker::new(&file.settings)?,
            settings: file.settings,
            embedder,
            entries: file.entries,
            built_at: file.built_at,
        };

        let hits = index.search("test", 1).map_err(|e| {
            CopilotError::StoreUnavailable(format!(
                "test query against {} failed: {}",
                path.display(),
                e.message()
            ))
        })?;
        tracing::info!(
            path = %path.display(),
            chunks = index.len(),
            test_hits = hits.len(),
            "index loaded"
        );

        Ok(index)
    }

    /// Read the metadata of a persisted index without loading an embedder
    pub fn inspect(index_dir: impl AsRef<Path>) -> Result<IndexSummary> {
        let path = index_dir.as_ref().join(INDEX_FILE);
        let file = read_index_file(&path)?;
        Ok(IndexSummary {
            path,
            embedding_model: file.settings.embedding_model,
            dimension: file.dimension,
            chunks: file.entries.len(),
            built_at: file.built_at,
        })
    }

    /// Chunk, embed and add one document; returns the number of chunks added
    pub fn add(&mut self, source: &str, text: &str) -> Result<usize> {
        self.add_with_progress(source, text, |_| {})
    }

    /// Like [`add`](Self::add), calling `on_batch` with the size of each embedded batch
    pub fn add_with_progress(
        &mut self,
        source: &str,
        text: &str,
        mut on_batch: impl FnMut(usize),
    ) -> Result<usize> {
        let chunks = self.chunker.chunk(text);

        // Entries land in the index only once every batch has embedded
        let mut added = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<&str> = batch.iter().map(String::as_str).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            if embeddings.len() != batch.len() {
                return Err(CopilotError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                )));
            }

            for (chunk, embedding) in batch.iter().zip(embeddings) {
                added.push(IndexEntry {
                    id: Uuid::new_v4(),
                    source: source.to_string(),
                    text: chunk.clone(),
                    embedding,
                });
            }
            on_batch(batch.len());
        }

        self.entries.extend(added);
        self.built_at = Utc::now();
        Ok(chunks.len())
    }

    /// Number of chunks `text` will produce
    pub fn chunk_count(&self, text: &str) -> usize {
        self.chunker.chunk(text).len()
    }

    /// Top-k chunks by cosine similarity, best first
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit<'_>>> {
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query)?;
        let mut hits: Vec<SearchHit<'_>> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                entry,
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Write the index to `<index_dir>/index.json`
    pub fn persist(&self, index_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let index_dir = index_dir.as_ref();
        fs::create_dir_all(index_dir)?;

        let file = IndexFile {
            settings: self.settings.clone(),
            dimension: self.embedder.dimension(),
            built_at: self.built_at,
            entries: self.entries.clone(),
        };

        let path = index_dir.join(INDEX_FILE);
        fs::write(&path, serde_json::to_string(&file)?)?;
        tracing::info!(path = %path.display(), chunks = self.len(), "index saved");
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

impl VectorStore for LocalVectorIndex {
    fn query(&self, text: &str, top_k: usize) -> Result<Vec<RetrievedDocument>> {
        Ok(self
            .search(text, top_k)?
            .into_iter()
            .map(|hit| RetrievedDocument::new(hit.entry.text.clone(), hit.score))
            .collect())
    }
}

fn read_index_file(path: &Path) -> Result<IndexFile> {
    if !path.exists() {
        return Err(CopilotError::StoreUnavailable(format!(
            "index not found at {}; run `compliance-copilot ingest` first",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        CopilotError::StoreUnavailable(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        CopilotError::StoreUnavailable(format!("failed to parse {}: {}", path.display(), e))
    })
}

/// Cosine similarity, 0.0 for zero vectors or mismatched lengths
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |acc, (x, y)| {
        let (x, y) = (*x as f64, *y as f64);
        (acc.0 + x * y, acc.1 + x * x, acc.2 + y * y)
    });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
