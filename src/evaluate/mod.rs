//! Batch evaluation against gold question/answer pairs
//!
//! Every question is answered in concise mode and the predicted answer is
//! recorded next to its gold answer. Scoring the pairs is left to external
//! tooling; the report is plain JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{CopilotError, Result};
use crate::rag::{AnswerPipeline, AnswerRequest};

/// Default location of the gold pairs
pub const DEFAULT_QA_FILE: &str = "data/qa_eval.json";

/// Default location of the written report
pub const DEFAULT_RESULTS_FILE: &str = "evaluation_results.json";

/// One gold pair as stored in the evaluation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Gold and predicted answer for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub gold: String,
    /// Generated text, or the outcome message when no answer was produced
    pub predicted: String,
    pub answered: bool,
}

/// Full evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub num_questions: usize,
    pub num_answered: usize,
    pub evaluated_at: DateTime<Utc>,
    pub predictions: Vec<EvaluationRecord>,
}

impl EvaluationReport {
    /// Write the report as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %path.display(), questions = self.num_questions, "evaluation saved");
        Ok(path.to_path_buf())
    }
}

/// Read gold pairs from a JSON array of `{ "question", "answer" }` objects
pub fn load_qa_pairs(path: impl AsRef<Path>) -> Result<Vec<QaPair>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(CopilotError::Generic(format!(
            "evaluation file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path)?;
    let pairs: Vec<QaPair> = serde_json::from_str(&contents)?;
    if pairs.is_empty() {
        return Err(CopilotError::Generic(format!(
            "evaluation file {} holds no question/answer pairs",
            path.display()
        )));
    }
    Ok(pairs)
}

/// Answer every pair in concise mode
///
/// `on_record` sees each record as soon as it is produced, with its
/// 1-based position.
pub fn evaluate(
    pipeline: &AnswerPipeline,
    pairs: &[QaPair],
    mut on_record: impl FnMut(usize, &EvaluationRecord),
) -> EvaluationReport {
    let mut predictions = Vec::with_capacity(pairs.len());

    for (idx, pair) in pairs.iter().enumerate() {
        let result = pipeline.handle(&AnswerRequest::new(pair.question.as_str()).concise());
        let record = EvaluationRecord {
            question: pair.question.clone(),
            gold: pair.answer.clone(),
            predicted: result.to_string(),
            answered: result.is_answered(),
        };
        tracing::debug!(question = %record.question, answered = record.answered, "evaluated");
        on_record(idx + 1, &record);
        predictions.push(record);
    }

    EvaluationReport {
        num_questions: pairs.len(),
        num_answered: predictions.iter().filter(|r| r.answered).count(),
        evaluated_at: Utc::now(),
        predictions,
    }
}
