//! Grocer CLI - Database migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront and session migrations
//! grocer migrate
//!
//! # Load or refresh the catalog from YAML
//! grocer seed catalog --file crates/cli/seed/catalog.yaml
//!
//! # Check a catalog file without touching the database
//! grocer seed catalog --file crates/cli/seed/catalog.yaml --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "grocer")]
#[command(author, version, about = "Grocer CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database from YAML files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert catalog products and their stock
    Catalog {
        /// Path to the catalog YAML file
        #[arg(short, long)]
        file: PathBuf,

        /// Validate the file and stop
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file, dry_run } => {
                commands::seed::catalog(&file, dry_run).await?;
            }
        },
    }
    Ok(())
}
