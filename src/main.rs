use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use paper_qa::{pdf, AppError, AppResult, OllamaClient, OllamaConfig, QaConfig, QaSession};

#[derive(Parser)]
#[command(
    name = "paper-qa",
    about = "Ask questions about a PDF research paper, answered by a local Ollama model",
    version
)]
struct Cli {
    /// Path to the PDF to load
    pdf: Option<PathBuf>,

    /// Ask a single question and exit (default: interactive prompt)
    #[arg(long, short = 'q')]
    question: Option<String>,

    /// Ollama model used for answer generation
    #[arg(long, default_value = "llama3.2")]
    model: String,

    /// Ollama model used for embeddings
    #[arg(long, default_value = "nomic-embed-text:latest")]
    embedding_model: String,

    /// Base URL of the Ollama server
    #[arg(long, default_value = "http://localhost:11434")]
    base_url: String,

    /// Maximum chunk length in characters
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[arg(long, default_value_t = 200)]
    chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[arg(long, default_value_t = 3)]
    top_k: usize,

    /// Maximum assembled context size in characters
    #[arg(long, default_value_t = 4000)]
    context_budget: usize,

    /// List models available on the Ollama server and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let ollama = Arc::new(OllamaClient::new(OllamaConfig {
        base_url: cli.base_url,
        model: cli.model,
        embedding_model: cli.embedding_model,
    })?);

    if cli.list_models {
        for name in ollama.list_models().await? {
            println!("{name}");
        }
        return Ok(());
    }

    let Some(pdf_path) = cli.pdf else {
        return Err(AppError::InvalidConfiguration(
            "a PDF path is required unless --list-models is given".into(),
        ));
    };

    let config = QaConfig {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
        top_k: cli.top_k,
        context_budget: cli.context_budget,
    };
    let mut session = QaSession::new(config, ollama.clone(), ollama)?;

    let text = pdf::extract_text(&pdf_path)?;
    println!("Loading {} ...", pdf_path.display());

    // Ctrl-C during ingestion cancels the build; the session stays usable.
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let stats = session.load_document(text, &cancel).await;
    watcher.abort();
    let stats = stats?;

    println!("Title:   {}", stats.title.as_deref().unwrap_or("(not detected)"));
    println!("Authors: {}", stats.authors.as_deref().unwrap_or("(not detected)"));
    println!(
        "Indexed {} chunks ({} dims) from {} characters.",
        stats.chunk_count, stats.dimensions, stats.text_chars
    );

    if let Some(question) = cli.question {
        let answer = session.ask(&question).await?;
        println!("\n{answer}");
        return Ok(());
    }

    interactive_loop(&session).await
}

/// Read questions from stdin until EOF or an exit command.
async fn interactive_loop(session: &QaSession) -> AppResult<()> {
    println!("\nAsk a question about the paper (\"exit\" to quit).");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if stdout.write_all(b"\n? ").await.is_err() || stdout.flush().await.is_err() {
            break;
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => break,
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        // A failed question aborts only the current question, not the session.
        match session.ask(question).await {
            Ok(answer) => println!("{answer}"),
            Err(e) => eprintln!("error: {e}"),
        }
    }

    Ok(())
}
