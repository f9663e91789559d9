//! Doctor command for system diagnostics
//!
//! Checks that every component the copilot needs at runtime is in place.

use colored::Colorize;
use std::path::Path;

use crate::cli::Config;
use crate::index::LocalVectorIndex;
use crate::llm::OllamaGenerator;
use crate::ner::classifier::REQUIRED_FILES;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass(String),
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    /// What to run when the check does not pass
    pub hint: Option<String>,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
            hint: None,
        }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
}

impl Doctor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run all health checks
    pub fn run_diagnostics(&self) -> Vec<HealthCheck> {
        vec![
            self.check_config(),
            self.check_index(),
            self.check_ner_model(),
            self.check_ollama(),
        ]
    }

    /// Check 1: configuration values
    fn check_config(&self) -> HealthCheck {
        match self.config.validate() {
            Ok(()) => HealthCheck::new("Configuration", HealthStatus::Pass("valid".to_string())),
            Err(e) => HealthCheck::new("Configuration", HealthStatus::Fail(e.message()))
                .with_hint("fix ~/.compliance-copilot/config.toml or pass --config"),
        }
    }

    /// Check 2: persisted vector index
    fn check_index(&self) -> HealthCheck {
        let index_dir = self.config.index_dir();
        match LocalVectorIndex::inspect(&index_dir) {
            Ok(summary) if summary.embedding_model != self.config.index.embedding_model => {
                HealthCheck::new(
                    "Vector Index",
                    HealthStatus::Fail(format!(
                        "built with {} but {} is configured",
                        summary.embedding_model, self.config.index.embedding_model
                    )),
                )
                .with_hint("compliance-copilot ingest")
            }
            Ok(summary) if summary.chunks == 0 => {
                HealthCheck::new("Vector Index", HealthStatus::Warn("index is empty".to_string()))
                    .with_hint("add documents to the docs directory and run compliance-copilot ingest")
            }
            Ok(summary) => HealthCheck::new(
                "Vector Index",
                HealthStatus::Pass(format!(
                    "{} chunks, built {}",
                    summary.chunks,
                    summary.built_at.format("%Y-%m-%d %H:%M UTC")
                )),
            ),
            Err(e) => HealthCheck::new("Vector Index", HealthStatus::Fail(e.message()))
                .with_hint("compliance-copilot ingest"),
        }
    }

    /// Check 3: NER model directory
    fn check_ner_model(&self) -> HealthCheck {
        let model_dir = self.config.ner_model_dir();
        let missing = missing_files(&model_dir, REQUIRED_FILES);

        if missing.is_empty() {
            HealthCheck::new(
                "NER Model",
                HealthStatus::Pass(model_dir.display().to_string()),
            )
        } else {
            HealthCheck::new(
                "NER Model",
                HealthStatus::Fail(format!(
                    "missing {} in {}",
                    missing.join(", "),
                    model_dir.display()
                )),
            )
            .with_hint("place a fine-tuned token classification model in [ner] model_dir")
        }
    }

    /// Check 4: Ollama reachable and model installed
    fn check_ollama(&self) -> HealthCheck {
        let generator = match OllamaGenerator::with_config(
            &self.config.ollama_url(),
            &self.config.ollama.model,
            self.config.ollama.temperature,
            self.config.ollama_timeout(),
        ) {
            Ok(generator) => generator,
            Err(e) => return HealthCheck::new("Ollama", HealthStatus::Fail(e.message())),
        };

        if !generator.health_check() {
            return HealthCheck::new(
                "Ollama",
                HealthStatus::Fail(format!("not reachable at {}", generator.base_url())),
            )
            .with_hint("ollama serve");
        }

        match generator.list_models() {
            Ok(models) if has_model(&models, generator.model()) => HealthCheck::new(
                "Ollama",
                HealthStatus::Pass(format!("{} available", generator.model())),
            ),
            Ok(_) => HealthCheck::new(
                "Ollama",
                HealthStatus::Warn(format!("model {} not installed", generator.model())),
            )
            .with_hint(format!("ollama pull {}", generator.model())),
            Err(e) => HealthCheck::new("Ollama", HealthStatus::Warn(e.message())),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "Compliance Copilot Diagnostics".bold());
        println!("{:<16} Status", "Check");
        println!("{}", "=".repeat(60));

        for check in checks {
            let line = match &check.status {
                HealthStatus::Pass(msg) => format!("PASS {}", msg).green(),
                HealthStatus::Warn(msg) => format!("WARN {}", msg).yellow(),
                HealthStatus::Fail(msg) => format!("FAIL {}", msg).red(),
            };
            println!("{:<16} {}", check.name, line);
            if let Some(hint) = &check.hint {
                if !matches!(check.status, HealthStatus::Pass(_)) {
                    println!("{:<16} {} {}", "", "->".dimmed(), hint.cyan());
                }
            }
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

fn missing_files(dir: &Path, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .filter(|name| !dir.join(name).is_file())
        .map(|name| name.to_string())
        .collect()
}

/// Ollama reports tags such as `llama3.2:latest`
fn has_model(installed: &[String], model: &str) -> bool {
    installed.iter().any(|name| {
        name == model || name.split(':').next() == Some(model)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{Embedder, IndexSettings};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct UnitEmbedder;

    impl Embedder for UnitEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> crate::Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.index.index_dir = dir.join("index").to_string_lossy().into_owned();
        config.ner.model_dir = dir.join("ner").to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_overall_status() {
        let pass = HealthCheck::new("a", HealthStatus::Pass("ok".to_string()));
        let warn = HealthCheck::new("b", HealthStatus::Warn("hmm".to_string()));
        let fail = HealthCheck::new("c", HealthStatus::Fail("no".to_string()));

        assert!(Doctor::overall_status(&[pass.clone(), warn.clone()]));
        assert!(!Doctor::overall_status(&[pass, warn, fail]));
    }

    #[test]
    fn test_missing_index_fails_with_hint() {
        let temp_dir = TempDir::new().unwrap();
        let check = Doctor::new(config_in(temp_dir.path())).check_index();

        assert!(matches!(check.status, HealthStatus::Fail(_)));
        assert_eq!(check.hint.as_deref(), Some("compliance-copilot ingest"));
    }

    #[test]
    fn test_built_index_passes() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());

        let mut index =
            LocalVectorIndex::new(IndexSettings::default(), Arc::new(UnitEmbedder)).unwrap();
        index.add("kyc.txt", "KYC Policy").unwrap();
        index.persist(config.index_dir()).unwrap();

        let check = Doctor::new(config).check_index();
        assert!(matches!(check.status, HealthStatus::Pass(ref m) if m.starts_with("1 chunks")));
    }

    #[test]
    fn test_ner_model_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(temp_dir.path());
        let doctor = Doctor::new(config.clone());

        assert!(matches!(doctor.check_ner_model().status, HealthStatus::Fail(_)));

        std::fs::create_dir_all(config.ner_model_dir()).unwrap();
        for name in REQUIRED_FILES {
            std::fs::write(config.ner_model_dir().join(name), "{}").unwrap();
        }
        assert!(matches!(doctor.check_ner_model().status, HealthStatus::Pass(_)));
    }

    #[test]
    fn test_invalid_config_fails() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        let check = Doctor::new(config).check_config();
        assert!(matches!(check.status, HealthStatus::Fail(_)));
    }

    #[test]
    fn test_unreachable_ollama() {
        let mut config = Config::default();
        config.ollama.port = 1;
        let check = Doctor::new(config).check_ollama();
        assert!(matches!(check.status, HealthStatus::Fail(_)));
        assert_eq!(check.hint.as_deref(), Some("ollama serve"));
    }

    #[test]
    fn test_has_model_matches_tags() {
        let installed = vec!["llama3.2:latest".to_string(), "mistral:7b".to_string()];
        assert!(has_model(&installed, "llama3.2"));
        assert!(has_model(&installed, "mistral:7b"));
        assert!(!has_model(&installed, "qwen2.5"));
    }
}
