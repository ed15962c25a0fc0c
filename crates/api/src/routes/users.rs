//! Profile route handlers.

use axum::{Router, extract::State, routing::get};
use tripnest_core::{ProfilePatch, PublicProfile, UserId, UserProfile};

use super::extract::{JsonBody, PathParams};
use super::response::ApiResponse;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::ProfileService;
use crate::state::AppState;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me).put(update_me))
        .route("/users/{uid}", get(show))
}

/// The caller's profile, created on first access.
async fn me(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
) -> Result<ApiResponse<UserProfile>> {
    let profile = ProfileService::new(state.store())
        .get_or_create_profile(&identity)
        .await?;
    Ok(ApiResponse::ok(profile))
}

async fn update_me(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    JsonBody(patch): JsonBody<ProfilePatch>,
) -> Result<ApiResponse<UserProfile>> {
    let profile = ProfileService::new(state.store())
        .update_profile(&identity, patch)
        .await?;
    Ok(ApiResponse::ok(profile))
}

/// Anyone's profile, without contact details.
async fn show(
    State(state): State<AppState>,
    PathParams(uid): PathParams<UserId>,
) -> Result<ApiResponse<PublicProfile>> {
    let profile = ProfileService::new(state.store()).get_profile(&uid).await?;
    Ok(ApiResponse::ok(profile.into()))
}
