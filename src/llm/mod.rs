//! Text generation backends
//!
//! The answer pipeline only sees [`Generator`]; [`OllamaGenerator`] is the
//! production implementation.

pub mod client;

pub use client::OllamaGenerator;

use crate::errors::Result;

/// Capability: turn a prompt into text
///
/// Failures carry a message and are reported to callers as values, never
/// as panics.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}
