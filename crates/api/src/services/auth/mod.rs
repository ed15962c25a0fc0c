//! Caller identity.
//!
//! Requests carry `Authorization: Bearer <token>`. A [`TokenVerifier`] turns
//! the token into an [`Identity`]; the HTTP extractors in
//! `middleware::auth` call it and hand the identity to the routes.
//!
//! # Token format
//!
//! [`JwtTokenVerifier`] accepts HS256 JSON Web Tokens signed with the shared
//! secret. `exp` is required; `sub` becomes the caller's uid and the optional
//! `email`, `name` and `picture` claims fill in the profile. The CLI mints
//! tokens with the same secret.

mod error;

pub use error::AuthError;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tripnest_core::UserId;

/// The verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl Identity {
    /// An identity with only a uid.
    #[must_use]
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            name: None,
            picture: None,
        }
    }
}

/// Turns a bearer token into an identity.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and return the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` for malformed, mis-signed or expired tokens.
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    exp: i64,
}

/// HS256 JSON Web Tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenVerifier")
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl JwtTokenVerifier {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token for `identity` valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Lifetime` if `ttl` overflows the clock, or
    /// `AuthError::Encoding` if the token cannot be signed.
    pub fn issue(&self, identity: &Identity, ttl: Duration) -> Result<String, AuthError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(AuthError::Lifetime)?;
        let claims = Claims {
            sub: identity.uid.to_string(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            picture: identity.picture.clone(),
            exp: expires_at.timestamp(),
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    fn decode(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(map_decode_error)?
            .claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::Malformed("missing subject".to_owned()));
        }

        debug!(uid = %claims.sub, "Token verified");

        Ok(Identity {
            uid: UserId::new(claims.sub),
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        })
    }
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        _ => AuthError::Malformed(error.to_string()),
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.decode(token)
    }
}
