//! Terminal output for answers and entities
//!
//! Shared by the one-shot subcommands and the chat loop.

use colored::*;

use crate::ner::{EntitySpan, TokenEntity};
use crate::rag::AnswerResult;

/// Show welcome banner
pub fn show_banner(version: &str, model: &str) {
    let width = 64;
    println!("\n{}", "=".repeat(width).cyan());
    println!("{}", format!("  Financial Compliance Copilot {}", version).bold().cyan());
    println!("{}", format!("  Model: {} | RAG + NER", model).dimmed());
    println!("{}\n", "=".repeat(width).cyan());
}

/// Print an answer outcome; failures go to stderr
pub fn show_answer(result: &AnswerResult) {
    match result {
        AnswerResult::Answered { text, used_fallback, .. } => {
            println!("\n{}", "Answer:".bold().green());
            println!("{}", text);
            if *used_fallback {
                println!("{}", "(based on general compliance documents)".dimmed());
            }
        }
        AnswerResult::NoDocuments => println!("{}", result.to_string().yellow()),
        AnswerResult::GenerationError { .. } | AnswerResult::RetrievalError { .. } => {
            show_error(&result.to_string())
        }
    }
}

/// Print grouped entities as an aligned table
pub fn show_entities(entities: &[EntitySpan]) {
    if entities.is_empty() {
        println!("   {}", "No entities found".yellow());
        return;
    }

    println!("\n{}", "Extracted Entities:".bold().cyan());
    for entity in entities {
        println!("   • {:<25} → {}", entity.text, entity.entity_type.green());
    }
}

/// Print per-token labels
pub fn show_token_labels(entities: &[TokenEntity]) {
    if entities.is_empty() {
        println!("   {}", "No entities found".yellow());
        return;
    }

    for entity in entities {
        println!("   {:<25} {}", entity.token, entity.label.cyan());
    }
}

pub fn show_error(error: &str) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}

pub fn show_warning(warning: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), warning);
}

pub fn show_info(info: &str) {
    println!("{}", info.cyan());
}
