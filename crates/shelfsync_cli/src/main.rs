//! ShelfSync CLI
//!
//! Command-line access to a file-backed shelf and its sync state.
//!
//! # Commands
//!
//! - `add`, `capture` - Store new records
//! - `list` - Show records, optionally filtered
//! - `favorite`, `move`, `use`, `delete` - Edit records
//! - `export`, `import`, `seed` - Move whole collections
//! - `sync`, `enable`, `disable`, `status` - Sync with the remote file
//! - `inspect-remote` - Examine the remote index and chunks

mod commands;

use clap::{Parser, Subcommand};
use commands::Profile;
use shelfsync_codec::Category;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shelf and sync tools for ShelfSync profiles.
#[derive(Parser)]
#[command(name = "shelfsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Profile directory holding the local store
    #[arg(global = true, short, long, default_value = ".shelfsync")]
    profile: PathBuf,

    /// Remote store file shared with other profiles
    /// (defaults to <profile>/remote.json)
    #[arg(global = true, short, long)]
    remote: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a record
    Add {
        /// Body text
        text: String,

        /// Title
        #[arg(short, long, default_value = "")]
        title: String,

        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,

        /// Category (favorite, recent, other)
        #[arg(short, long, default_value = "other")]
        category: String,
    },

    /// Add selected text, titled by its first five words
    Capture {
        /// Selected text
        text: String,
    },

    /// List records, newest first
    List {
        /// Only show records matching this text
        #[arg(short, long)]
        query: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Toggle a record between favorite and other
    Favorite {
        /// Record id
        id: String,
    },

    /// Move a record to another category
    Move {
        /// Record id
        id: String,

        /// Category (favorite, recent, other)
        category: String,
    },

    /// Mark a record as used and print its text
    Use {
        /// Record id
        id: String,
    },

    /// Delete a record
    Delete {
        /// Record id
        id: String,
    },

    /// Export the collection as JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the collection with records from a JSON file
    Import {
        /// Input file
        input: PathBuf,
    },

    /// Add sample records to an empty shelf
    Seed,

    /// Pull from the remote file, then push the local collection
    Sync,

    /// Enable sync
    Enable,

    /// Disable sync
    Disable,

    /// Show shelf and sync status
    Status,

    /// Examine the remote index and chunks
    InspectRemote {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("shelfsync {}", env!("CARGO_PKG_VERSION"));
        println!("Remote index version: {}", shelfsync_codec::INDEX_VERSION);
        println!("Max chunk bytes: {}", shelfsync_codec::DEFAULT_MAX_CHUNK_BYTES);
        return Ok(());
    }

    let profile = Profile::open(&cli.profile, cli.remote.as_deref())?;

    match cli.command {
        Commands::Add {
            text,
            title,
            tags,
            category,
        } => {
            let category = parse_category(&category)?;
            commands::shelf::add(&profile, title, text, &tags, category).await?;
        }
        Commands::Capture { text } => {
            commands::shelf::capture(&profile, &text).await?;
        }
        Commands::List { query, format } => {
            commands::shelf::list(&profile, query.as_deref().unwrap_or(""), &format).await?;
        }
        Commands::Favorite { id } => {
            commands::shelf::favorite(&profile, &id).await?;
        }
        Commands::Move { id, category } => {
            let category = parse_category(&category)?;
            commands::shelf::move_to(&profile, &id, category).await?;
        }
        Commands::Use { id } => {
            commands::shelf::mark_used(&profile, &id).await?;
        }
        Commands::Delete { id } => {
            commands::shelf::delete(&profile, &id).await?;
        }
        Commands::Export { output } => {
            commands::transfer::export(&profile, output.as_deref()).await?;
        }
        Commands::Import { input } => {
            commands::transfer::import(&profile, &input).await?;
        }
        Commands::Seed => {
            commands::transfer::seed(&profile).await?;
        }
        Commands::Sync => {
            commands::sync::run(&profile).await?;
        }
        Commands::Enable => {
            commands::sync::set_enabled(&profile, true).await?;
        }
        Commands::Disable => {
            commands::sync::set_enabled(&profile, false).await?;
        }
        Commands::Status => {
            commands::sync::status(&profile).await?;
        }
        Commands::InspectRemote { format } => {
            commands::inspect::run(&profile, &format).await?;
        }
        Commands::Version => {}
    }

    Ok(())
}

fn parse_category(name: &str) -> Result<Category, Box<dyn std::error::Error>> {
    Category::parse(name).ok_or_else(|| {
        format!("Unknown category {name:?} (expected favorite, recent or other)").into()
    })
}
