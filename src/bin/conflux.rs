//! Conflux CLI — hybrid retrieval over the demo EV corpus.
//!
//! Usage:
//!   conflux ask "<query>" [--mode user-insight] [--db path] [--config path]
//!   conflux chat [--mode user-insight] [--db path] [--config path]

use clap::{Parser, Subcommand};
use conflux::retriever::CancellationToken;
use conflux::store::seed::{demo_vocabulary, seed_graph, seed_vectors};
use conflux::store::{MemoryVectorDriver, SqliteGraphDriver};
use conflux::{ConfluxEngine, CycleOutcome, RetrievalConfig, TargetMode};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "conflux",
    version,
    about = "Hybrid graph + vector retrieval for EV product questions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single query and exit
    Ask {
        /// The question to answer
        query: String,
        /// Product mode: user-insight, competitor-comparison, document-drafting
        #[arg(long, default_value = "user-insight", value_parser = parse_mode)]
        mode: TargetMode,
        /// Path to the SQLite graph database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Path to a YAML retrieval config
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Interactive multi-turn session (reads queries from stdin)
    Chat {
        /// Product mode: user-insight, competitor-comparison, document-drafting
        #[arg(long, default_value = "user-insight", value_parser = parse_mode)]
        mode: TargetMode,
        /// Path to the SQLite graph database file
        #[arg(long)]
        db: Option<PathBuf>,
        /// Path to a YAML retrieval config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn parse_mode(value: &str) -> Result<TargetMode, String> {
    match value {
        "user-insight" => Ok(TargetMode::UserInsight),
        "competitor-comparison" => Ok(TargetMode::CompetitorComparison),
        "document-drafting" => Ok(TargetMode::DocumentDrafting),
        other => Err(format!(
            "unknown mode '{other}' (expected user-insight, competitor-comparison, or document-drafting)"
        )),
    }
}

/// Default database path (~/.local/share/conflux/conflux.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let conflux_dir = data_dir.join("conflux");
    std::fs::create_dir_all(&conflux_dir).ok();
    conflux_dir.join("conflux.db")
}

fn load_config(path: Option<PathBuf>) -> Result<RetrievalConfig, String> {
    match path {
        Some(path) => RetrievalConfig::from_yaml_file(&path)
            .map_err(|e| format!("Failed to load config: {e}")),
        None => Ok(RetrievalConfig::default()),
    }
}

fn build_engine(db: Option<PathBuf>, config: RetrievalConfig) -> Result<ConfluxEngine, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let graph = SqliteGraphDriver::open(&db_path)
        .map_err(|e| format!("Failed to open graph database: {e}"))?;
    // Deterministic IDs make reseeding an existing file a no-op.
    seed_graph(&graph).map_err(|e| format!("Failed to seed graph: {e}"))?;

    let vector = build_vector_driver()?;
    seed_vectors(&vector).map_err(|e| format!("Failed to seed vector store: {e}"))?;

    Ok(ConfluxEngine::new(
        Arc::new(demo_vocabulary()),
        Arc::new(graph),
        Arc::new(vector),
        config,
    ))
}

#[cfg(feature = "embeddings")]
fn build_vector_driver() -> Result<MemoryVectorDriver, String> {
    match conflux::store::FastembedEmbedder::new() {
        Ok(embedder) => Ok(MemoryVectorDriver::new(Arc::new(embedder))),
        Err(e) => {
            tracing::warn!(error = %e, "embedding model unavailable, using hash embedder");
            Ok(MemoryVectorDriver::with_hash_embedder())
        }
    }
}

#[cfg(not(feature = "embeddings"))]
fn build_vector_driver() -> Result<MemoryVectorDriver, String> {
    Ok(MemoryVectorDriver::with_hash_embedder())
}

fn print_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Evidence(assembled) => {
            println!("{}", assembled.context_block);
        }
        CycleOutcome::Direct(text) | CycleOutcome::NoData(text) => println!("{text}"),
        CycleOutcome::Clarify(candidates) => {
            println!("您指的是哪一个？");
            for candidate in candidates {
                println!("  - {candidate}");
            }
        }
    }
}

async fn cmd_ask(engine: &ConfluxEngine, query: &str, mode: TargetMode) -> i32 {
    let session = engine.open_session();
    let result = match engine
        .run(&session, query, mode, &CancellationToken::new())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };
    print_outcome(&result.outcome);
    engine.close_session(&session);
    0
}

async fn cmd_chat(engine: &ConfluxEngine, mode: TargetMode) -> i32 {
    let session = engine.open_session();
    let stdin = std::io::stdin();
    println!("conflux chat — 输入问题，exit 退出");

    loop {
        print!("> ");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "exit" || query == "quit" {
            break;
        }

        match engine
            .run(&session, query, mode, &CancellationToken::new())
            .await
        {
            Ok(result) => {
                print_outcome(&result.outcome);
                engine.commit(&session, &result, &result.outcome.fallback_answer());
            }
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    }

    engine.close_session(&session);
    0
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Ask {
            query,
            mode,
            db,
            config,
        } => match load_config(config).and_then(|cfg| build_engine(db, cfg)) {
            Ok(engine) => cmd_ask(&engine, &query, mode).await,
            Err(e) => {
                eprintln!("Error: {e}");
                1
            }
        },
        Commands::Chat { mode, db, config } => {
            match load_config(config).and_then(|cfg| build_engine(db, cfg)) {
                Ok(engine) => cmd_chat(&engine, mode).await,
                Err(e) => {
                    eprintln!("Error: {e}");
                    1
                }
            }
        }
    };
    std::process::exit(code);
}
