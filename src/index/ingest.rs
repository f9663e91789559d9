// Index construction from a directory of text documents
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{CopilotError, Result};
use crate::index::embedding::Embedder;
use crate::index::settings::IndexSettings;
use crate::index::store::LocalVectorIndex;

/// File extensions picked up from the documents directory
const DOC_EXTENSIONS: &[&str] = &["txt", "md"];

/// Queries run against a freshly built index
pub const SMOKE_QUERIES: &[&str] = &["KYC documents", "AML monitoring", "compliance requirements"];

/// A document read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub name: String,
    pub path: PathBuf,
    pub text: String,
}

/// Result of one smoke query
#[derive(Debug, Clone, PartialEq)]
pub struct SmokeResult {
    pub query: String,
    pub hits: usize,
    pub top_score: Option<f64>,
}

/// Read every `.txt` / `.md` file in `docs_dir`, sorted by file name
pub fn load_documents(docs_dir: impl AsRef<Path>) -> Result<Vec<SourceDocument>> {
    let docs_dir = docs_dir.as_ref();
    let entries = fs::read_dir(docs_dir).map_err(|e| {
        CopilotError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read documents directory {}: {}", docs_dir.display(), e),
        ))
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| DOC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());
        tracing::debug!(source = %name, chars = text.chars().count(), "loaded document");
        documents.push(SourceDocument { name, path, text });
    }

    Ok(documents)
}

/// Build an index over `documents`
///
/// `show_progress` draws a progress bar over the embedded chunks.
pub fn build_index(
    documents: &[SourceDocument],
    settings: IndexSettings,
    embedder: Arc<dyn Embedder>,
    show_progress: bool,
) -> Result<LocalVectorIndex> {
    if documents.is_empty() {
        return Err(CopilotError::StoreUnavailable(
            "no documents found to index".to_string(),
        ));
    }

    let mut index = LocalVectorIndex::new(settings, embedder)?;
    let total_chunks: usize = documents.iter().map(|d| index.chunk_count(&d.text)).sum();

    let pb = if show_progress {
        let pb = ProgressBar::new(total_chunks as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    for document in documents {
        pb.set_message(document.name.clone());
        let added = index.add_with_progress(&document.name, &document.text, |n| pb.inc(n as u64))?;
        tracing::info!(source = %document.name, chunks = added, "indexed document");
    }
    pb.finish_and_clear();

    Ok(index)
}

/// Run [`SMOKE_QUERIES`] with k = 2
pub fn smoke_test(index: &LocalVectorIndex) -> Result<Vec<SmokeResult>> {
    SMOKE_QUERIES
        .iter()
        .map(|query| {
            let hits = index.search(query, 2)?;
            let result = SmokeResult {
                query: query.to_string(),
                hits: hits.len(),
                top_score: hits.first().map(|h| h.score),
            };
            tracing::info!(query, hits = result.hits, top_score = ?result.top_score, "smoke query");
            Ok(result)
        })
        .collect()
}

/// Load, build, smoke-test and persist in one step
pub fn ingest(
    docs_dir: impl AsRef<Path>,
    index_dir: impl AsRef<Path>,
    settings: IndexSettings,
    embedder: Arc<dyn Embedder>,
    show_progress: bool,
) -> Result<(LocalVectorIndex, Vec<SmokeResult>)> {
    let documents = load_documents(&docs_dir)?;
    if documents.is_empty() {
        return Err(CopilotError::StoreUnavailable(format!(
            "no documents found in {}",
            docs_dir.as_ref().display()
        )));
    }

    let index = build_index(&documents, settings, embedder, show_progress)?;
    let smoke = smoke_test(&index)?;
    index.persist(index_dir)?;
    Ok((index, smoke))
}
