//! Interactive chat mode
//!
//! Reads lines with rustyline and dispatches them to the answer pipeline or
//! the entity extractor. A failing command prints its error and the loop
//! continues.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use colored::*;

use crate::ner::FinancialNer;
use crate::rag::{AnswerPipeline, PromptMode};
pub use crate::repl::commands::Command;
use crate::repl::input::{Input, InputHandler};

/// Chat session coordinator
pub struct ChatSession {
    pipeline: AnswerPipeline,
    ner: Option<FinancialNer>,
    verbose: bool,
    questions: usize,
}

impl ChatSession {
    /// `ner` is `None` when the NER model could not be loaded
    pub fn new(pipeline: AnswerPipeline, ner: Option<FinancialNer>) -> Self {
        Self {
            pipeline,
            ner,
            verbose: false,
            questions: 0,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Questions answered so far
    pub fn question_count(&self) -> usize {
        self.questions
    }

    /// Run the read-eval-print loop until exit or EOF
    pub fn run(&mut self, mut input: InputHandler) -> Result<()> {
        commands::show_help();

        loop {
            let line = match input.read_line()? {
                Input::Line(line) => line,
                Input::Interrupted | Input::Eof => {
                    println!("{}", "Goodbye!".green());
                    break;
                }
            };

            if !self.execute(commands::parse(&line)) {
                break;
            }
        }

        if let Err(e) = input.save_history() {
            tracing::warn!("failed to save chat history: {}", e);
        }
        Ok(())
    }

    /// Execute a command; returns false when the session should end
    pub fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Empty => {}
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                return false;
            }
            Command::Help => commands::show_help(),
            Command::Usage { message } => display::show_error(message),
            Command::Verbose { enable } => {
                self.verbose = enable;
                let status = if enable { "enabled" } else { "disabled" };
                display::show_info(&format!("Verbose mode {}", status));
            }
            Command::Ask { question } => {
                display::show_info("Searching knowledge base...");
                let result = self.pipeline.answer(&question, PromptMode::Detailed, self.verbose);
                self.questions += 1;
                display::show_answer(&result);
            }
            Command::Ner { text } => match &self.ner {
                Some(ner) => {
                    display::show_info("Extracting entities...");
                    match ner.extract_grouped(&text) {
                        Ok(entities) => display::show_entities(&entities),
                        Err(e) => display::show_error(&e.to_string()),
                    }
                }
                None => display::show_error("NER model is not available; run `compliance-copilot doctor`"),
            },
        }
        true
    }
}
