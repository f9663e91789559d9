//! Compliance Copilot - Main CLI Entry Point

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::process;
use std::sync::Arc;

use compliance_copilot::{
    cli::{Args, Commands, Config, Verbosity},
    doctor::Doctor,
    evaluate,
    index::{self, EmbeddingEngine, LocalVectorIndex},
    llm::OllamaGenerator,
    ner::{FinancialNer, TokenClassifier},
    rag::{AnswerPipeline, AnswerRequest, RetrievalEngine},
    repl::{display, input::InputHandler, ChatSession},
    telemetry::{ConsoleSink, DiagnosticSink, TracingSink},
    CopilotError,
};

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbosity());

    let mut config = match Config::load(args.config.clone()) {
        Ok(config) => config,
        Err(e) => fail_init("configuration", &e, &["check the file passed with --config"]),
    };
    args.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        fail_init("configuration", &e, &["fix the values listed above"]);
    }

    match &args.command {
        Commands::Ingest { .. } => run_ingest(&config, args.verbosity()),
        Commands::Ask {
            question,
            concise,
            verbose,
            ..
        } => run_ask(&config, question, *concise, *verbose),
        Commands::Ner { text, raw, json } => run_ner(&config, text, *raw, *json),
        Commands::Chat { verbose } => run_chat(&config, *verbose),
        Commands::Evaluate { qa, out } => run_evaluate(&config, qa, out),
        Commands::Doctor => run_doctor(&config),
    }
}

/// `RUST_LOG` wins; otherwise the level follows `-v` / `-q`
fn init_tracing(verbosity: Verbosity) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(verbosity.filter_directive()))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Report which component failed to start and how to fix it, then exit
fn fail_init(component: &str, error: &CopilotError, hints: &[&str]) -> ! {
    eprintln!("{} {} failed to initialize", "Error:".red().bold(), component);
    eprintln!("  {}", error.message());
    if !hints.is_empty() {
        eprintln!("\nMake sure you have:");
        for (i, hint) in hints.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, hint);
        }
    }
    process::exit(1);
}

fn load_embedder(config: &Config) -> Arc<EmbeddingEngine> {
    match EmbeddingEngine::new(&config.index.embedding_model) {
        Ok(engine) => Arc::new(engine),
        Err(e) => fail_init(
            "embedding model",
            &e,
            &["network access to the Hugging Face Hub, or a populated local cache"],
        ),
    }
}

fn load_pipeline(config: &Config, sink: Arc<dyn DiagnosticSink>) -> AnswerPipeline {
    let embedder = load_embedder(config);
    let index = match LocalVectorIndex::open(config.index_dir(), config.index_settings(), embedder) {
        Ok(index) => index,
        Err(e) => fail_init(
            "vector index",
            &e,
            &[
                "added .txt or .md files to the documents directory",
                "run `compliance-copilot ingest`",
            ],
        ),
    };

    let generator = match OllamaGenerator::with_config(
        &config.ollama_url(),
        &config.ollama.model,
        config.ollama.temperature,
        config.ollama_timeout(),
    ) {
        Ok(generator) => generator,
        Err(e) => fail_init("Ollama client", &e, &["a valid [ollama] host and port"]),
    };
    if !generator.health_check() {
        display::show_warning(&format!(
            "Ollama is not reachable at {}. Start it with: ollama serve",
            generator.base_url()
        ));
    }

    let retrieval = RetrievalEngine::with_top_k(Arc::new(index), config.retrieval.top_k);
    AnswerPipeline::with_retrieval(retrieval, Arc::new(generator)).with_sink(sink)
}

fn load_ner(config: &Config) -> compliance_copilot::Result<FinancialNer> {
    let classifier = TokenClassifier::load(config.ner_model_dir())?;
    Ok(FinancialNer::new(Arc::new(classifier)))
}

fn run_ingest(config: &Config, verbosity: Verbosity) -> Result<()> {
    let docs_dir = config.docs_dir();
    let index_dir = config.index_dir();
    println!("Indexing documents from {}", docs_dir.display().to_string().cyan());

    let embedder = load_embedder(config);
    let (built, smoke) = match index::ingest(
        &docs_dir,
        &index_dir,
        config.index_settings(),
        embedder,
        verbosity.show_progress(),
    ) {
        Ok(result) => result,
        Err(e) => fail_init(
            "ingest",
            &e,
            &[&format!("put .txt or .md files in {}", docs_dir.display())],
        ),
    };

    println!(
        "{} Indexed {} chunks into {}",
        "✓".green(),
        built.len(),
        index_dir.display()
    );
    println!("\nTesting retrieval:");
    for result in smoke {
        let score = result
            .top_score
            .map(|s| format!("{:.3}", s))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<26} {} hits, top score {}", result.query, result.hits, score);
    }
    Ok(())
}

fn run_ask(config: &Config, question: &str, concise: bool, verbose: bool) -> Result<()> {
    let sink: Arc<dyn DiagnosticSink> = if verbose {
        Arc::new(ConsoleSink)
    } else {
        Arc::new(TracingSink)
    };
    let pipeline = load_pipeline(config, sink);

    let mut request = AnswerRequest::new(question).verbose(verbose);
    if concise {
        request = request.concise();
    }

    let result = pipeline.handle(&request);
    display::show_answer(&result);
    if !result.is_answered() {
        process::exit(1);
    }
    Ok(())
}

fn run_ner(config: &Config, text: &str, raw: bool, json: bool) -> Result<()> {
    let ner = match load_ner(config) {
        Ok(ner) => ner,
        Err(e) => fail_init(
            "NER model",
            &e,
            &[&format!(
                "a fine-tuned token classification model in {}",
                config.ner_model_dir().display()
            )],
        ),
    };

    if raw {
        let entities = ner.extract(text)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&entities)?);
        } else {
            display::show_token_labels(&entities);
        }
    } else {
        let entities = ner.extract_grouped(text)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&entities)?);
        } else {
            display::show_entities(&entities);
        }
    }
    Ok(())
}

fn run_chat(config: &Config, verbose: bool) -> Result<()> {
    display::show_banner(env!("CARGO_PKG_VERSION"), &config.ollama.model);
    display::show_info("Initializing systems...");

    let pipeline = load_pipeline(config, Arc::new(ConsoleSink));
    let ner = match load_ner(config) {
        Ok(ner) => Some(ner),
        Err(e) => {
            display::show_warning(&format!("{}; `ner` is disabled", e.message()));
            None
        }
    };
    println!("{}\n", "All systems ready!".green());

    let input = match InputHandler::default_history_path() {
        Some(path) => InputHandler::with_history(path)?,
        None => InputHandler::new()?,
    };
    ChatSession::new(pipeline, ner).with_verbose(verbose).run(input)
}

fn run_evaluate(config: &Config, qa: &Path, out: &Path) -> Result<()> {
    let pairs = match evaluate::load_qa_pairs(qa) {
        Ok(pairs) => pairs,
        Err(e) => fail_init(
            "evaluation data",
            &e,
            &[&format!("a JSON array of question/answer pairs at {}", qa.display())],
        ),
    };
    println!("Loaded {} question/answer pairs", pairs.len());

    let pipeline = load_pipeline(config, Arc::new(TracingSink));
    let report = evaluate::evaluate(&pipeline, &pairs, |i, record| {
        println!("\n[{}/{}] {}", i, pairs.len(), record.question.bold());
        println!("   Gold:      {}", record.gold);
        if record.answered {
            println!("   Predicted: {}", record.predicted);
        } else {
            println!("   Predicted: {}", record.predicted.red());
        }
    });

    let saved = report.save(out)?;
    println!(
        "\n{} Answered {}/{} questions; results saved to {}",
        "✓".green(),
        report.num_answered,
        report.num_questions,
        saved.display()
    );
    Ok(())
}

fn run_doctor(config: &Config) -> Result<()> {
    let doctor = Doctor::new(config.clone());
    let checks = doctor.run_diagnostics();
    Doctor::display_results(&checks);

    process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}
