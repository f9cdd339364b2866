mod shell;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use page_builder_config::AppConfig;
use page_builder_core::history::doc_id_for_path;
use page_builder_core::{
    load_document, save_document, Document, EditorSession, HistoryConfig, PersistenceLayer,
};

use crate::shell::Shell;

/// Catalogue and landing-page builder with undo/redo history.
#[derive(Parser, Debug)]
#[command(name = "page-builder", version, about)]
struct Cli {
    /// Config file to use instead of `page-builder.json` next to the executable.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty document.
    New {
        file: PathBuf,
        /// Site title; defaults to `default_site_title` from the config.
        #[arg(long)]
        title: Option<String>,
    },
    /// Print the pages and components of a document.
    Show { file: PathBuf },
    /// Edit a document interactively, one command per line.
    Edit { file: PathBuf },
    /// Inspect or clear the stored undo history of a document.
    History {
        file: PathBuf,
        /// Delete the stored history.
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);
    tracing::debug!("Using config at {}", config_path.display());

    match cli.command {
        Command::New { file, title } => new_document(&file, title, &config),
        Command::Show { file } => {
            let doc = load_document(&file)?;
            let mut out = std::io::stdout().lock();
            shell::write_summary(&doc, &mut out)?;
            Ok(())
        }
        Command::Edit { file } => edit(&file, &config),
        Command::History { file, clear } => history(&file, clear, &config),
    }
}

fn new_document(path: &Path, title: Option<String>, config: &AppConfig) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    let title = title.unwrap_or_else(|| config.default_site_title.clone());
    save_document(path, &Document::new(&title), config.pretty_json)?;
    println!("Created {}", path.display());
    Ok(())
}

fn edit(path: &Path, config: &AppConfig) -> Result<()> {
    let history_config = HistoryConfig::from_app_config(config);
    let session = if config.persist_history {
        match PersistenceLayer::open(&history_config.data_dir) {
            Ok(pl) => EditorSession::open_file_with_persistence(path, &history_config, pl)?,
            Err(e) => {
                tracing::warn!(
                    "Failed to open undo history database, falling back to in-memory: {e}"
                );
                EditorSession::open_file(path, &history_config)?
            }
        }
    } else {
        EditorSession::open_file(path, &history_config)?
    };

    tracing::info!("Editing {}", path.display());
    let mut shell = Shell::new(session, config.pretty_json);
    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    shell.run(stdin, &mut stdout)
}

fn history(path: &Path, clear: bool, config: &AppConfig) -> Result<()> {
    let pl: Arc<PersistenceLayer> = PersistenceLayer::open(&config.resolve_data_dir())?;
    let doc_id = doc_id_for_path(path);

    if clear {
        pl.delete_document(&doc_id)
            .with_context(|| format!("failed to clear history for {}", path.display()))?;
        println!("Cleared undo history for {}", path.display());
        return Ok(());
    }

    match pl.load_meta(&doc_id)? {
        Some(meta) => {
            let saved_at = meta
                .saved_at()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "{}: {} snapshots, at step {}, written {saved_at}",
                path.display(),
                meta.len,
                meta.cursor + 1
            );
        }
        None => println!("{}: no stored undo history", path.display()),
    }
    Ok(())
}
