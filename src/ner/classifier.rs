//! Token classification backends
//!
//! [`TokenClassifier`] runs a fine-tuned BERT token-classification
//! checkpoint (`BertForTokenClassification` layout) via Candle. The model
//! directory must hold `config.json` (with `id2label`), `tokenizer.json`
//! and `model.safetensors`.

use anyhow::{Context, Result as AnyResult};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokenizers::{Tokenizer, TruncationParams};

use crate::errors::{CopilotError, Result};
use crate::ner::label::OUTSIDE;

/// Files a model directory must contain
pub const REQUIRED_FILES: &[&str] = &["config.json", "tokenizer.json", "model.safetensors"];

/// Capability: assign one BIO label to each input token
pub trait Classifier: Send + Sync {
    /// Returns exactly one label per token
    fn classify(&self, tokens: &[String]) -> Result<Vec<String>>;
}

/// Fields of the Hugging Face config needed for the classification head
#[derive(Debug, Deserialize)]
struct HeadConfig {
    hidden_size: usize,
    id2label: HashMap<String, String>,
    #[serde(default = "default_max_positions")]
    max_position_embeddings: usize,
}

fn default_max_positions() -> usize {
    512
}

/// BERT token classifier
pub struct TokenClassifier {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    id2label: Vec<String>,
    device: Device,
    model_dir: PathBuf,
}

impl TokenClassifier {
    /// Load the model from a local directory
    pub fn load(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        Self::load_inner(model_dir).map_err(|e| {
            CopilotError::ClassifierUnavailable(format!(
                "failed to load NER model from {}: {:#}",
                model_dir.display(),
                e
            ))
        })
    }

    fn load_inner(model_dir: &Path) -> AnyResult<Self> {
        let device = Device::Cpu;

        if !model_dir.exists() {
            anyhow::bail!("model directory not found");
        }
        if let Some(missing) = REQUIRED_FILES.iter().find(|f| !model_dir.join(f).is_file()) {
            anyhow::bail!("{} not found in model directory", missing);
        }

        let config_contents = std::fs::read_to_string(model_dir.join("config.json"))
            .context("Failed to read model config")?;
        let config: BertConfig =
            serde_json::from_str(&config_contents).context("Failed to parse model config")?;
        let head: HeadConfig = serde_json::from_str(&config_contents)
            .context("Failed to parse classification head config")?;
        let id2label = ordered_labels(&head.id2label)?;

        let mut tokenizer = Tokenizer::from_file(model_dir.join("tokenizer.json"))
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        // Sequences never exceed the position table
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: head.max_position_embeddings,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        let weights = model_dir.join("model.safetensors");
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)
                .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb.pp("bert"), &config)
            .context("Failed to create BERT encoder")?;
        let classifier = candle_nn::linear(head.hidden_size, id2label.len(), vb.pp("classifier"))
            .context("Failed to create classification head")?;

        tracing::info!(
            model_dir = %model_dir.display(),
            labels = id2label.len(),
            "NER model loaded"
        );

        Ok(Self {
            model,
            classifier,
            tokenizer,
            id2label,
            device,
            model_dir: model_dir.to_path_buf(),
        })
    }

    /// Label set in id order
    pub fn labels(&self) -> &[String] {
        &self.id2label
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    fn predict(&self, tokens: &[String]) -> AnyResult<Vec<String>> {
        let words: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let encoding = self
            .tokenizer
            .encode(words, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let ids = encoding.get_ids().to_vec();
        let seq_len = ids.len();
        let input_ids = Tensor::from_vec(ids, (1, seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let attention_mask = Tensor::from_vec(
            encoding.get_attention_mask().to_vec(),
            (1, seq_len),
            &self.device,
        )?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let logits = self.classifier.forward(&hidden)?;
        let predictions = logits.argmax(D::Minus1)?.to_vec2::<u32>()?;
        let predictions = predictions
            .into_iter()
            .next()
            .context("Model returned an empty batch")?;

        align_labels(encoding.get_word_ids(), &predictions, &self.id2label, tokens.len())
    }
}

impl Classifier for TokenClassifier {
    fn classify(&self, tokens: &[String]) -> Result<Vec<String>> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        self.predict(tokens)
            .map_err(|e| CopilotError::Classification(format!("{:#}", e)))
    }
}

/// Map sub-word predictions back onto `words` input words
///
/// Each word takes the prediction of its first sub-word. Special tokens have
/// no word id. Words cut off by truncation get no prediction and fall back
/// to `O`.
fn align_labels(
    word_ids: &[Option<u32>],
    predictions: &[u32],
    id2label: &[String],
    words: usize,
) -> AnyResult<Vec<String>> {
    let mut labels: Vec<Option<String>> = vec![None; words];
    for (position, word_id) in word_ids.iter().enumerate() {
        let Some(word_id) = word_id.map(|w| w as usize) else {
            continue;
        };
        if word_id >= labels.len() || labels[word_id].is_some() {
            continue;
        }
        let class = *predictions
            .get(position)
            .with_context(|| format!("No prediction for position {}", position))?
            as usize;
        let label = id2label
            .get(class)
            .with_context(|| format!("Prediction {} outside label set", class))?;
        labels[word_id] = Some(label.clone());
    }

    Ok(labels
        .into_iter()
        .map(|l| l.unwrap_or_else(|| OUTSIDE.to_string()))
        .collect())
}

/// Turn the `id2label` map into a dense vector indexed by class id
fn ordered_labels(id2label: &HashMap<String, String>) -> AnyResult<Vec<String>> {
    let mut pairs = id2label
        .iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|id| (id, label.clone()))
                .with_context(|| format!("Invalid label id: {}", id))
        })
        .collect::<AnyResult<Vec<_>>>()?;
    pairs.sort_by_key(|(id, _)| *id);

    for (expected, (id, _)) in pairs.iter().enumerate() {
        if *id != expected {
            anyhow::bail!("Label ids are not contiguous: missing {}", expected);
        }
    }
    if pairs.is_empty() {
        anyhow::bail!("Model config has no labels");
    }

    Ok(pairs.into_iter().map(|(_, label)| label).collect())
}
