//! Tripnest CLI - Database migrations, seeding and token tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations to the PostgreSQL document store
//! tripnest migrate
//!
//! # Load the destination catalogue from YAML
//! tripnest seed destinations data/destinations.yaml
//!
//! # Check a seed file without touching the database
//! tripnest seed destinations data/destinations.yaml --dry-run
//!
//! # Mint a bearer token for local testing
//! tripnest token -u u1 -e marta@example.com --ttl-hours 24
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed destinations` - Upsert destinations from a YAML file
//! - `token` - Mint an access token signed with `TRIPNEST_TOKEN_SECRET`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tripnest")]
#[command(author, version, about = "Tripnest CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the document store
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Mint an access token
    Token {
        /// User id (token subject)
        #[arg(short, long)]
        uid: String,

        /// Email claim
        #[arg(short, long)]
        email: Option<String>,

        /// Display name claim
        #[arg(short, long)]
        name: Option<String>,

        /// Lifetime in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert recommendation destinations from a YAML file
    Destinations {
        /// Path to the YAML file
        path: String,

        /// Validate the file without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Destinations { path, dry_run } => {
                commands::seed::destinations(&path, dry_run).await?;
            }
        },
        Commands::Token {
            uid,
            email,
            name,
            ttl_hours,
        } => commands::token::mint(&uid, email, name, ttl_hours)?,
    }
    Ok(())
}
