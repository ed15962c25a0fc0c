//! Database migration command.
//!
//! # Environment Variables
//!
//! - `TRIPNEST_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/api/migrations/` and are embedded at build time.

use tracing::info;
use tripnest_api::config::database_url_from_env;
use tripnest_api::store::postgres::{create_pool, run_migrations};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url_from_env()?;

    info!("Connecting to database...");
    let pool = create_pool(&database_url).await?;

    info!("Running migrations...");
    run_migrations(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
