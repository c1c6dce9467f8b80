mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use memograph::config::MemographConfig;

#[derive(Parser)]
#[command(name = "memograph", version, about = "Notes, relations and a force-directed memory graph")]
struct Cli {
    /// Config file (defaults to ~/.memograph/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save a new note
    Add(cli::add::AddArgs),
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Replace every relation of a note
    Relate {
        id: String,
        /// Notes to relate to; none clears all relations
        targets: Vec<String>,
    },
    /// Filter notes by title, content or category name
    Search { query: String },
    /// List the notes directly related to one note
    Neighbors { id: String },
    /// Run the layout to rest and print the visible graph as JSON
    Layout(cli::layout::LayoutArgs),
    /// Show graph statistics
    Stats,
    /// Export notes, relations and categories as JSON to stdout
    Export,
    /// Import an export file
    Import { file: PathBuf },
    /// Run database diagnostics
    Doctor,
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Create a category
    Add { name: String },
    /// List categories with note counts
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MemographConfig::load_from(path)?,
        None => MemographConfig::load()?,
    };

    // Log to stderr so stdout stays clean for JSON output.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Add(args) => cli::add::add(&config, args).await?,
        Command::Category { action } => match action {
            CategoryAction::Add { name } => cli::category::add(&config, &name).await?,
            CategoryAction::List => cli::category::list(&config).await?,
        },
        Command::Relate { id, targets } => cli::relate::relate(&config, &id, targets).await?,
        Command::Search { query } => cli::search::search(&config, &query).await?,
        Command::Neighbors { id } => cli::relate::neighbors(&config, &id).await?,
        Command::Layout(args) => cli::layout::layout(&config, args).await?,
        Command::Stats => cli::stats::stats(&config).await?,
        Command::Export => cli::export::export(&config)?,
        Command::Import { file } => cli::import::import(&config, &file)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
