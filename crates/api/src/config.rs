//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TRIPNEST_TOKEN_SECRET` - Access token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `TRIPNEST_HOST` - Bind address (default: 127.0.0.1)
//! - `TRIPNEST_PORT` - Listen port (default: 3000)
//! - `TRIPNEST_STORE` - `memory` or `postgres` (default: memory)
//! - `TRIPNEST_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; required when `TRIPNEST_STORE=postgres`)
//! - `TRIPNEST_AI_ENDPOINT` - Itinerary generation endpoint
//! - `TRIPNEST_AI_API_KEY` - API key for the itinerary endpoint
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("expected 'memory' or 'postgres', got '{other}'")),
        }
    }
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Document store backend
    pub store: StoreBackend,
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Access token signing secret
    pub token_secret: SecretString,
    /// Generative itinerary provider, if configured
    pub ai: Option<AiConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Generative itinerary provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AiConfig {
    /// Endpoint receiving itinerary requests
    pub endpoint: Url,
    /// Bearer key sent to the endpoint
    pub api_key: SecretString,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("TRIPNEST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRIPNEST_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("TRIPNEST_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRIPNEST_PORT".to_string(), e.to_string()))?;
        let store = get_env_or_default("TRIPNEST_STORE", "memory")
            .parse::<StoreBackend>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRIPNEST_STORE".to_string(), e))?;

        let database_url = get_database_url("TRIPNEST_DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar(
                "TRIPNEST_DATABASE_URL".to_string(),
            ));
        }

        let token_secret = token_secret_from_env()?;

        let ai = AiConfig::from_env()?;

        Ok(Self {
            host,
            port,
            store,
            database_url,
            token_secret,
            ai,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// In-memory configuration with the given token secret and no optional
    /// integrations. Used by tests and local tooling.
    #[must_use]
    pub fn with_token_secret(token_secret: SecretString) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            store: StoreBackend::Memory,
            database_url: None,
            token_secret,
            ai: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AiConfig {
    /// Both variables must be set together; neither means "rules only".
    fn from_env() -> Result<Option<Self>, ConfigError> {
        match (
            get_optional_env("TRIPNEST_AI_ENDPOINT"),
            get_optional_env("TRIPNEST_AI_API_KEY"),
        ) {
            (None, None) => Ok(None),
            (Some(endpoint), Some(api_key)) => {
                let endpoint = Url::parse(&endpoint).map_err(|e| {
                    ConfigError::InvalidEnvVar("TRIPNEST_AI_ENDPOINT".to_string(), e.to_string())
                })?;
                Ok(Some(Self {
                    endpoint,
                    api_key: SecretString::from(api_key),
                }))
            }
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                "TRIPNEST_AI_API_KEY".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(
                "TRIPNEST_AI_ENDPOINT".to_string(),
            )),
        }
    }
}

/// Load `TRIPNEST_DATABASE_URL` (or `DATABASE_URL`) on its own, for tools
/// that only talk to the database.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    get_database_url("TRIPNEST_DATABASE_URL")
        .ok_or_else(|| ConfigError::MissingEnvVar("TRIPNEST_DATABASE_URL".to_string()))
}

/// Load and validate `TRIPNEST_TOKEN_SECRET` on its own.
///
/// # Errors
///
/// Returns `ConfigError` if the secret is missing, a placeholder, too short
/// or too low in entropy.
pub fn token_secret_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    let token_secret = get_validated_secret("TRIPNEST_TOKEN_SECRET")?;
    validate_token_secret(&token_secret, "TRIPNEST_TOKEN_SECRET")?;
    Ok(token_secret)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that a token secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
