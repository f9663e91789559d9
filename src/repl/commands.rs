//! Chat command parsing
//!
//! The first word selects the command; anything unrecognised is a question.

use colored::*;

/// Chat command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask { question: String },
    Ner { text: String },
    Verbose { enable: bool },
    Help,
    Exit,
    /// Command given without its argument
    Usage { message: &'static str },
    Empty,
}

/// Parse one input line into a command
pub fn parse(input: &str) -> Command {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }

    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head.to_lowercase().as_str() {
        "exit" | "quit" => Command::Exit,
        "help" => Command::Help,
        "ask" if rest.is_empty() => Command::Usage {
            message: "Please provide a question. Example: ask What is KYC?",
        },
        "ask" => Command::Ask {
            question: rest.to_string(),
        },
        "ner" if rest.is_empty() => Command::Usage {
            message: "Please provide text. Example: ner Rahul sent money to HDFC",
        },
        "ner" => Command::Ner {
            text: rest.to_string(),
        },
        "verbose" => Command::Verbose {
            enable: !matches!(rest.to_lowercase().as_str(), "off" | "0" | "false"),
        },
        _ => Command::Ask {
            question: trimmed.to_string(),
        },
    }
}

/// Display help information
pub fn show_help() {
    println!("\n{}", "Available Commands:".bold().cyan());
    println!("{}", "=".repeat(60).cyan());

    let commands = [
        ("ask <question>", "Ask a compliance question"),
        ("ner <text>", "Extract entities from text"),
        ("verbose [on|off]", "Toggle retrieval diagnostics"),
        ("help", "Show this help message"),
        ("exit, quit", "Exit the application"),
    ];

    for (cmd, desc) in commands {
        println!("  {:<20} {}", cmd.green(), desc);
    }

    println!("\n{}", "Examples:".bold());
    println!("  ask What documents are needed for KYC?");
    println!("  ner Rahul transferred money to HDFC account 1234567890");
    println!("\nInput without a command is treated as a question.");
    println!();
}
