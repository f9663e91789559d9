//! Command-line argument parsing for Compliance Copilot
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::config::Config;
use crate::evaluate::{DEFAULT_QA_FILE, DEFAULT_RESULTS_FILE};

/// Compliance Copilot - answer compliance questions and tag financial entities
#[derive(Parser, Debug)]
#[command(name = "compliance-copilot")]
#[command(version)]
#[command(about = "Local RAG assistant and entity extractor for financial compliance", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Ollama host (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Ollama port (overrides config)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Ollama model (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Log verbosity: -v (info), -vv (debug), -vvv (trace)
    #[arg(short = 'v', long = "log-level", action = clap::ArgAction::Count, global = true)]
    pub log_level: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Build the vector index from the documents directory
    Ingest {
        /// Documents directory (overrides config)
        #[arg(long)]
        docs: Option<PathBuf>,

        /// Output index directory (overrides config)
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Answer one compliance question
    Ask {
        /// Question text
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Ask for a short answer (at most two sentences)
        #[arg(long)]
        concise: bool,

        /// Print retrieval diagnostics
        #[arg(long)]
        verbose: bool,

        /// Number of documents to retrieve (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Extract financial entities from text
    Ner {
        /// Input text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Print per-token labels instead of grouped spans
        #[arg(long)]
        raw: bool,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Start interactive chat mode
    Chat {
        /// Print retrieval diagnostics for every question
        #[arg(long)]
        verbose: bool,
    },

    /// Answer gold questions in concise mode and save predictions
    Evaluate {
        /// Gold question/answer pairs (JSON)
        #[arg(long, default_value = DEFAULT_QA_FILE)]
        qa: PathBuf,

        /// Where to write the results (JSON)
        #[arg(long, default_value = DEFAULT_RESULTS_FILE)]
        out: PathBuf,
    },

    /// Check the index, the NER model and Ollama
    Doctor,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.log_level {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                2 => Verbosity::Debug,
                _ => Verbosity::Trace,
            }
        }
    }

    /// Apply command-line overrides on top of a loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.ollama.host = host.clone();
        }
        if let Some(port) = self.port {
            config.ollama.port = port;
        }
        if let Some(model) = &self.model {
            config.ollama.model = model.clone();
        }
        match &self.command {
            Commands::Ingest { docs, index } => {
                if let Some(docs) = docs {
                    config.index.docs_dir = docs.to_string_lossy().into_owned();
                }
                if let Some(index) = index {
                    config.index.index_dir = index.to_string_lossy().into_owned();
                }
            }
            Commands::Ask { top_k: Some(k), .. } => config.retrieval.top_k = *k,
            _ => {}
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }

    /// Default `tracing` filter directive when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
