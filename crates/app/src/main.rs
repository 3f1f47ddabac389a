use clap::{Parser, Subcommand};
use doc_rag_core::{
    discover_document_files, AppConfig, AnswerResult, GeminiEmbedder, GeminiGenerator,
    RagPipeline, SupabaseStore, DEFAULT_TOP_K,
};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-rag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive session: ingest documents, then ask questions.
    Chat,
    /// Index a PDF/DOCX file, or every document under a folder.
    Ingest {
        /// File or folder to index.
        #[arg(long)]
        path: String,
        /// Flush each document as one batch write instead of per-sentence
        /// inserts.
        #[arg(long, default_value_t = false)]
        batch: bool,
    },
    /// Ask a single question over the indexed documents.
    Ask {
        /// The question.
        #[arg(long)]
        query: String,
        /// Number of chunks to retrieve.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Restrict retrieval to chunks from this source filename.
        #[arg(long)]
        file: Option<String>,
    },
}

type Pipeline = RagPipeline<GeminiEmbedder, SupabaseStore, GeminiGenerator>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    // Missing credentials abort here, before any request is served.
    let config = AppConfig::from_env()?;
    let embedder = GeminiEmbedder::new(&config)?;
    let store = SupabaseStore::new(&config)?;
    let generator = GeminiGenerator::new(&config)?;
    let pipeline = RagPipeline::new(embedder, store, generator);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %chrono::Utc::now().to_rfc3339(),
        "doc-rag boot"
    );

    match cli.command {
        Command::Chat => run_chat(&pipeline).await?,
        Command::Ingest { path, batch } => run_ingest(&pipeline, &path, batch).await,
        Command::Ask {
            query,
            top_k,
            file,
        } => {
            let result = pipeline.search(&query, top_k, file.as_deref()).await?;
            print_answer(&result);
        }
    }

    Ok(())
}

async fn run_ingest(pipeline: &Pipeline, path: &str, batch: bool) {
    let path = Path::new(path);
    let files = if path.is_dir() {
        discover_document_files(path)
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        warn!(folder = %path.display(), "no indexable documents found");
        return;
    }

    let mut indexed = 0usize;
    for file in files {
        let outcome = if batch {
            pipeline.index_file_batched(&file).await
        } else {
            pipeline.index_file(&file).await
        };

        match outcome {
            Ok(count) => {
                indexed += count;
                println!("indexed {} chunks from {}", count, file.display());
            }
            Err(error) => {
                warn!(path = %file.display(), %error, "skipped document");
                println!("error indexing {}: {error}", file.display());
            }
        }
    }

    println!("{indexed} chunks indexed in total");
}

/// The original interactive flow: ingest file paths until `done`, then
/// answer questions until `exit`. Per-item errors are reported and the loop
/// keeps going; only here are errors caught instead of propagated.
async fn run_chat(pipeline: &Pipeline) -> anyhow::Result<()> {
    println!("Document ingestion phase. Enter file paths (PDF/DOCX). Type 'done' when finished.");
    loop {
        let line = match prompt_line("Enter file path (or 'done' to finish): ")? {
            Some(line) => line,
            None => return Ok(()),
        };

        if line.eq_ignore_ascii_case("done") {
            break;
        }

        let path = Path::new(&line);
        if !path.exists() {
            println!("File not found, try again.");
            continue;
        }

        match pipeline.index_file(path).await {
            Ok(count) => println!("Indexed {count} chunks from {}", path.display()),
            Err(error) => println!("Error indexing {}: {error}", path.display()),
        }
    }

    println!("\nSearch phase. Ask questions. Type 'exit' to quit.");
    loop {
        let question = match prompt_line("Your question: ")? {
            Some(line) => line,
            None => return Ok(()),
        };

        if question.eq_ignore_ascii_case("exit") {
            println!("Exiting. Goodbye!");
            break;
        }

        if question.is_empty() {
            continue;
        }

        match pipeline.search(&question, DEFAULT_TOP_K, None).await {
            Ok(result) => {
                print_answer(&result);
                println!("\n{}\n", "=".repeat(60));
            }
            Err(error) => println!("Error answering question: {error}"),
        }
    }

    Ok(())
}

fn print_answer(result: &AnswerResult) {
    println!("\nAnswer:\n{}", result.answer);
    println!("\nSources:");
    for source in &result.sources {
        println!(
            "- {} (score: {}) -> {}",
            source.filename, source.similarity, source.snippet
        );
    }
}

/// Reads one trimmed line from stdin; `None` on end of input.
fn prompt_line(prompt: &str) -> anyhow::Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
