//! Mint access tokens for local development and smoke tests.

use chrono::Duration;
use tripnest_api::config::token_secret_from_env;
use tripnest_api::services::auth::{Identity, JwtTokenVerifier};

/// Lifetime for `ttl_hours`.
///
/// # Errors
///
/// Returns an error if the lifetime is not positive or does not fit a
/// `Duration`.
fn lifetime(ttl_hours: i64) -> Result<Duration, &'static str> {
    if ttl_hours <= 0 {
        return Err("ttl-hours must be positive");
    }
    Duration::try_hours(ttl_hours).ok_or("ttl-hours too large")
}

/// Print an HS256 token for `uid` valid for `ttl_hours`.
///
/// # Errors
///
/// Returns an error if `TRIPNEST_TOKEN_SECRET` is missing or weak, or the
/// lifetime is out of range.
pub fn mint(
    uid: &str,
    email: Option<String>,
    name: Option<String>,
    ttl_hours: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    let ttl = lifetime(ttl_hours)?;

    let verifier = JwtTokenVerifier::new(&token_secret_from_env()?);
    let identity = Identity {
        email,
        name,
        ..Identity::new(uid)
    };
    let token = verifier.issue(&identity, ttl)?;

    tracing::info!(uid, ttl_hours, "Token minted");
    #[allow(clippy::print_stdout)]
    {
        println!("{token}");
    }
    Ok(())
}
