//! Seed the destination catalogue from a YAML file.
//!
//! ```yaml
//! destinations:
//!   - id: lisbon
//!     name: Lisbon
//!     country: Portugal
//!     tags: [beach, food, nightlife]
//!     rating: 4.6
//!     coordinates: { latitude: 38.72, longitude: -9.14 }
//! ```
//!
//! Destinations are upserted by id, so re-running the command is safe.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};
use tripnest_api::config::database_url_from_env;
use tripnest_api::store::postgres::{PgStore, create_pool};
use tripnest_api::store::{DESTINATIONS, Document, DocumentStore};
use tripnest_core::Destination;

#[derive(Debug, Deserialize)]
struct SeedFile {
    destinations: Vec<Destination>,
}

/// Problems with a seed file, one message per offending entry.
fn validate(destinations: &[Destination]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, d) in destinations.iter().enumerate() {
        let label = format!("#{index} ({})", d.id);
        if d.id.as_str().trim().is_empty() {
            errors.push(format!("#{index}: id is required"));
        } else if !seen.insert(d.id.as_str()) {
            errors.push(format!("{label}: duplicate id"));
        }
        if d.name.trim().is_empty() {
            errors.push(format!("{label}: name is required"));
        }
        if d.rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
            errors.push(format!("{label}: rating must be between 0 and 5"));
        }
        if d.coordinates.is_some_and(|c| !c.is_valid()) {
            errors.push(format!("{label}: coordinates out of range"));
        }
    }

    errors
}

/// Upsert destinations from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or the database write fails.
pub async fn destinations(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading destinations from file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    info!(count = seed.destinations.len(), "Parsed seed file");

    let errors = validate(&seed.destinations);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    if dry_run {
        info!("Dry run: seed file is valid, nothing written");
        return Ok(());
    }

    let database_url = database_url_from_env()?;
    let store = PgStore::new(create_pool(&database_url).await?);
    info!("Connected to database");

    for destination in &seed.destinations {
        store
            .put(DESTINATIONS, Document::from_entity(destination)?)
            .await?;
    }

    info!(upserted = seed.destinations.len(), "Seeding complete!");
    Ok(())
}
