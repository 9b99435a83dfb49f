use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use docrag_core::config::{Config, Settings};
use docrag_core::types::{IndexOutcome, OwnerId};
use docrag_engine::{DirectoryDocumentStore, RagEngine, ReindexCoordinator};

#[derive(Parser)]
#[command(name = "docrag", about = "Ask questions about your own documents", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show engine mode and per-component state
    Status {
        /// Print the three-flag view instead of the detailed one
        #[arg(long)]
        legacy: bool,
    },
    /// Index one text file for an owner
    Index {
        file: PathBuf,
        #[arg(long)]
        owner: OwnerId,
        /// Source label stored with the passage (defaults to the file name)
        #[arg(long)]
        source: Option<String>,
    },
    /// Ask a question over an owner's documents
    Query {
        #[arg(long)]
        owner: OwnerId,
        #[arg(value_parser = non_empty_query)]
        query: String,
    },
    /// Rebuild the index from a `<dir>/<user_id>/<file>` document tree
    Reindex {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn non_empty_query(s: &str) -> Result<String, String> {
    if s.trim().is_empty() { Err("query must not be empty".to_string()) } else { Ok(s.to_string()) }
}

fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    Ok(config.settings()?.resolve_paths(&env::current_dir()?))
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&std::fs::read(path)?).to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings()?;
    let engine = Arc::new(RagEngine::from_settings(&settings).await);

    if !matches!(cli.command, Command::Reindex { .. }) {
        let store = Arc::new(DirectoryDocumentStore::new(&settings.reindex.documents_dir));
        let coordinator =
            ReindexCoordinator::new(Arc::clone(&engine), store, settings.reindex.on_startup);
        if let Some(report) = coordinator.reindex_on_startup().await {
            tracing::info!(
                indexed = report.indexed,
                failed = report.failed,
                "startup reindex done"
            );
        }
    }

    match cli.command {
        Command::Status { legacy } => {
            let status = engine.get_status().await;
            let rendered = if legacy {
                serde_json::to_string_pretty(&status.legacy_flags())?
            } else {
                serde_json::to_string_pretty(&status)?
            };
            println!("{}", rendered);
        }
        Command::Index { file, owner, source } => {
            let content = read_file_content(&file)?;
            let source = source.unwrap_or_else(|| {
                file.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| file.display().to_string())
            });
            match engine.index_document(&content, &source, owner).await {
                IndexOutcome::Indexed => println!("✅ Indexed {} for owner {}", source, owner),
                IndexOutcome::Skipped => {
                    println!("⚠️  Engine is in minimal mode; {} was not indexed", source)
                }
                IndexOutcome::Failed(msg) => println!("❌ Indexing {} failed: {}", source, msg),
            }
        }
        Command::Query { owner, query } => {
            let result = engine.query_document(owner, &query).await;
            println!("{}", result.answer);
            if !result.sources.is_empty() {
                println!("\nSources:");
                for source in &result.sources {
                    println!("  - {}", source);
                }
            }
        }
        Command::Reindex { dir } => {
            let dir = dir.unwrap_or_else(|| settings.reindex.documents_dir.clone());
            let store = Arc::new(DirectoryDocumentStore::new(&dir));
            let coordinator = ReindexCoordinator::new(Arc::clone(&engine), store, false);

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")?);
            spinner.set_message(format!("Reindexing {}", dir.display()));
            spinner.enable_steady_tick(Duration::from_millis(120));
            let report = coordinator.reindex_now().await;
            spinner.finish_and_clear();

            if report.degraded {
                println!("⚠️  Engine is in minimal mode; nothing was reindexed");
            } else {
                println!(
                    "📊 Indexed {}, skipped {} empty, {} failed{}",
                    report.indexed,
                    report.skipped_empty,
                    report.failed,
                    if report.cleared { " (index cleared first)" } else { "" }
                );
            }
            if let Some(err) = report.error {
                println!("❌ {}", err);
            }
        }
    }
    Ok(())
}
