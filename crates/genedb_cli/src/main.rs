//! GeneDB CLI
//!
//! Command-line tools for GeneDB database directories.
//!
//! # Commands
//!
//! - `inspect` - Display record counts and metadata
//! - `verify` - Check for dangling references
//! - `upgrade` - Run pending schema migrations
//! - `history` - List the undo history

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// GeneDB command-line database tools.
#[derive(Parser)]
#[command(name = "genedb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display record counts and metadata
    Inspect {
        /// List surnames
        #[arg(short, long)]
        surnames: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check every reference points at a live record
    Verify,

    /// Run pending schema migrations
    Upgrade {
        /// Dry run - show what would be done
        #[arg(short, long)]
        dry_run: bool,
    },

    /// List undoable transactions, newest first
    History {
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { surnames, format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&path, surnames, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Database path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Upgrade { dry_run } => {
            let path = cli.path.ok_or("Database path required for upgrade")?;
            commands::upgrade::run(&path, dry_run)?;
        }
        Commands::History { limit } => {
            let path = cli.path.ok_or("Database path required for history")?;
            commands::history::run(&path, limit)?;
        }
        Commands::Version => {
            println!("GeneDB CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("GeneDB Core v{}", genedb_core::VERSION);
            println!("Schema version {}", genedb_core::SCHEMA_VERSION);
        }
    }

    Ok(())
}
