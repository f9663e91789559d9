//! Ollama generation client
//!
//! Non-streaming `POST /api/generate` with a low temperature for factual
//! answers. Calls block the current thread until Ollama replies or the
//! request timeout elapses.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{CopilotError, Result};
use crate::llm::Generator;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama generation client
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: Client,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OllamaGenerator {
    /// Create client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(
            DEFAULT_OLLAMA_URL,
            DEFAULT_MODEL,
            DEFAULT_TEMPERATURE,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create client with custom configuration
    pub fn with_config(
        base_url: &str,
        model: &str,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CopilotError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    fn request_generation(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| CopilotError::OllamaApi(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CopilotError::OllamaApi(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .map_err(|e| CopilotError::OllamaApi(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(
            model = %self.model,
            eval_count = body.eval_count.unwrap_or(0),
            "generation complete"
        );
        Ok(body.response)
    }

    /// Check if Ollama is reachable
    pub fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).timeout(Duration::from_secs(2)).send() {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// List installed models
    pub fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| CopilotError::OllamaApi(format!("Failed to list models: {}", e)))?;

        if !response.status().is_success() {
            return Err(CopilotError::OllamaApi(
                "Failed to retrieve model list".to_string(),
            ));
        }

        let models: ModelsResponse = response
            .json()
            .map_err(|e| CopilotError::OllamaApi(format!("Failed to parse models: {}", e)))?;

        Ok(models.models.into_iter().map(|m| m.name).collect())
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

impl Generator for OllamaGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        self.request_generation(prompt)
            .map_err(|e| CopilotError::Generation(e.message()))
    }
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

/// Ollama generate response (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}
