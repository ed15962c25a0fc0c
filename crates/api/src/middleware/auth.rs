//! Authentication extractors.
//!
//! Both extractors read `Authorization: Bearer <token>` and verify it with the
//! state's [`TokenVerifier`](crate::services::auth::TokenVerifier).

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use tracing::debug;

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::Identity;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Missing tokens are rejected with 401, as are tokens that fail
/// verification.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(identity): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", identity.uid)
/// }
/// ```
pub struct RequireAuth(pub Identity);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;
        Ok(Self(authenticate(state, token).await?))
    }
}

/// Extractor that identifies the caller when a token is present.
///
/// Anonymous requests pass through as `None`. A token that is present but
/// invalid is still rejected with 401.
pub struct OptionalAuth(pub Option<Identity>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(Self(Some(authenticate(state, token).await?))),
            None => Ok(Self(None)),
        }
    }
}

/// The bearer token, if an `Authorization` header is present.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let malformed = || AppError::Unauthorized("Malformed authorization header".to_string());
    let value = header.to_str().map_err(|_| malformed())?;
    let (scheme, token) = value.split_once(' ').ok_or_else(malformed)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(malformed());
    }
    Ok(Some(token))
}

async fn authenticate(state: &AppState, token: &str) -> Result<Identity, AppError> {
    let identity = state.verifier().verify(token).await.map_err(|e| {
        debug!(error = %e, "Token rejected");
        AppError::Auth(e)
    })?;

    tracing::Span::current().record("user_id", identity.uid.as_str());
    set_sentry_user(&identity.uid, identity.email.as_deref());
    Ok(identity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/trips");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts(None)).unwrap(), None);
        assert_eq!(
            bearer_token(&parts(Some("Bearer abc.def"))).unwrap(),
            Some("abc.def")
        );
        assert_eq!(
            bearer_token(&parts(Some("bearer abc.def"))).unwrap(),
            Some("abc.def")
        );
        assert!(bearer_token(&parts(Some("Basic dXNlcg=="))).is_err());
        assert!(bearer_token(&parts(Some("Bearer "))).is_err());
        assert!(bearer_token(&parts(Some("Bearer"))).is_err());
    }
}
