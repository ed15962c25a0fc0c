//! Token verification error types.

use thiserror::Error;

/// Errors that can occur while verifying or issuing access tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token does not decode or lacks a required claim.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not match, or the token is not HS256.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// The requested lifetime puts `exp` outside the representable range.
    #[error("token lifetime out of range")]
    Lifetime,

    /// The token could not be signed.
    #[error("token encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}
