//! ragbot command-line host.
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`); stdout only
//! carries command output.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use ragbot_retrieval::{
    DocumentInfo, LoadReport, RagConfig, RagEngine, document_info, list_documents,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// Ask questions about your documents
#[derive(Parser)]
#[command(name = "ragbot")]
#[command(version)]
#[command(about = "Index documents and answer questions from them")]
struct Cli {
    /// TOML configuration file (defaults to <config dir>/ragbot/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk, and index documents
    Load {
        /// Files (.txt, .pdf, .docx) or directories of them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print file details of documents as JSON
    Info {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Show the fragments most similar to a query
    Search {
        query: String,

        /// Number of results
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Answer a question from the indexed documents
    Ask {
        question: String,

        /// Token budget of the answer
        #[arg(long)]
        max_tokens: Option<usize>,
    },
    /// Print index statistics as JSON
    Stats,
    /// Remove every indexed fragment
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Info { paths } = &cli.command {
        let infos = describe(paths)?;
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    let config = load_config(cli.config.as_deref()).await?;
    let engine = RagEngine::new(config)
        .await
        .context("failed to open the vector index")?;

    match cli.command {
        Commands::Load { paths } => {
            let mut report = LoadReport::default();
            for path in &paths {
                if path.is_dir() {
                    let part = engine
                        .load_directory(path)
                        .await
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    report.merge(part);
                } else {
                    report.merge(engine.load_documents(std::slice::from_ref(path)).await);
                }
            }
            for doc in &report.loaded {
                println!("Loaded {} ({} chunks)", doc.path.display(), doc.chunks);
            }
            for doc in &report.failed {
                println!("Failed {}: {}", doc.path.display(), doc.error);
            }
            println!(
                "Successfully processed {} documents with {} total chunks.",
                report.loaded.len(),
                report.total_chunks()
            );
        }
        Commands::Search { query, top_k } => {
            let hits = engine.search(&query, top_k).await;
            if hits.is_empty() {
                println!("No relevant documents found.");
            }
            for (rank, hit) in hits.iter().enumerate() {
                println!("Result {} (Score: {:.3})", rank + 1, hit.score);
                println!("Source: {}", hit.source);
                println!("Content: {}\n", hit.preview);
            }
        }
        Commands::Ask {
            question,
            max_tokens,
        } => {
            let response = engine.ask(&question, max_tokens).await;
            println!("Answer: {}", response.answer);
            if !response.sources.is_empty() {
                println!("\nSources: {}", response.sources.join(", "));
            }
        }
        Commands::Stats => {
            let stats = engine.stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Info { .. } => {}
        Commands::Clear => {
            engine.clear().await.context("failed to clear the vector index")?;
            println!("Index cleared.");
        }
    }

    Ok(())
}

fn describe(paths: &[PathBuf]) -> anyhow::Result<Vec<DocumentInfo>> {
    let mut infos = Vec::new();
    for path in paths {
        let files = if path.is_dir() {
            list_documents(path)?
        } else {
            vec![path.clone()]
        };
        for file in files {
            let info = document_info(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            infos.push(info);
        }
    }
    Ok(infos)
}

async fn load_config(explicit: Option<&Path>) -> anyhow::Result<RagConfig> {
    if let Some(path) = explicit {
        info!("Loading configuration from {}", path.display());
        return RagConfig::load(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()));
    }

    let default_path = dirs::config_dir().map(|dir| dir.join("ragbot/config.toml"));
    match default_path {
        Some(path) if path.exists() => {
            info!("Loading configuration from {}", path.display());
            RagConfig::load(&path)
                .await
                .with_context(|| format!("failed to load {}", path.display()))
        }
        _ => Ok(RagConfig::default()),
    }
}
