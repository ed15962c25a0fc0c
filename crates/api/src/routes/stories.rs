//! Story route handlers.
//!
//! Reading is public; writing requires a token. Liking and commenting are open
//! to any authenticated user, edits and deletes to the author only.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tripnest_core::{Comment, CommentId, LikeStatus, NewStory, Story, StoryId, StoryPatch, UserId};

use super::extract::{JsonBody, PathParams, QueryParams};
use super::response::{ApiResponse, MessageResponse, PagedResponse};
use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::services::{ServiceError, StoryService};
use crate::state::AppState;

/// Build the stories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stories", get(list_public).post(create))
        .route("/stories/user/{user_id}", get(list_for_user))
        .route("/stories/{id}", get(show).put(update).delete(destroy))
        .route("/stories/{id}/like", post(toggle_like))
        .route("/stories/{id}/comments", post(add_comment))
        .route("/stories/{id}/comments/{comment_id}", delete(delete_comment))
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    limit: Option<usize>,
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommentRequest {
    text: String,
}

async fn list_public(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FeedQuery>,
) -> Result<PagedResponse<Story>> {
    let cursor = query.cursor.filter(|c| !c.is_empty());
    let page = StoryService::new(state.store())
        .list_public_stories(query.limit, cursor)
        .await?;
    Ok(page.into())
}

/// A user's stories. Private ones are included only for that user.
async fn list_for_user(
    OptionalAuth(identity): OptionalAuth,
    State(state): State<AppState>,
    PathParams(user_id): PathParams<UserId>,
) -> Result<ApiResponse<Vec<Story>>> {
    let mut stories = StoryService::new(state.store())
        .list_user_stories(&user_id)
        .await?;

    let is_self = identity.is_some_and(|identity| identity.uid == user_id);
    if !is_self {
        stories.retain(|story| story.is_public);
    }
    Ok(ApiResponse::ok(stories))
}

/// A single story. Private stories are visible to their author only and
/// read as not found for everyone else.
async fn show(
    OptionalAuth(identity): OptionalAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<StoryId>,
) -> Result<ApiResponse<Story>> {
    let story = StoryService::new(state.store()).get_story(&id).await?;

    let is_author = identity.is_some_and(|identity| identity.uid == story.user_id);
    if !story.is_public && !is_author {
        return Err(ServiceError::NotFound("story".to_owned()).into());
    }
    Ok(ApiResponse::ok(story))
}

async fn create(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    JsonBody(new_story): JsonBody<NewStory>,
) -> Result<ApiResponse<Story>> {
    let story = StoryService::new(state.store())
        .create_story(&identity.uid, new_story)
        .await?;
    Ok(ApiResponse::created(story))
}

async fn update(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<StoryId>,
    JsonBody(patch): JsonBody<StoryPatch>,
) -> Result<ApiResponse<Story>> {
    let story = StoryService::new(state.store())
        .update_story(&id, &identity.uid, patch)
        .await?;
    Ok(ApiResponse::ok(story))
}

async fn destroy(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<StoryId>,
) -> Result<MessageResponse> {
    StoryService::new(state.store())
        .delete_story(&id, &identity.uid)
        .await?;
    Ok(MessageResponse::new("Story deleted"))
}

async fn toggle_like(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<StoryId>,
) -> Result<ApiResponse<LikeStatus>> {
    let status = StoryService::new(state.store())
        .toggle_like(&id, &identity.uid)
        .await?;
    Ok(ApiResponse::ok(status))
}

async fn add_comment(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<StoryId>,
    JsonBody(request): JsonBody<CommentRequest>,
) -> Result<ApiResponse<Comment>> {
    let comment = StoryService::new(state.store())
        .add_comment(&id, &identity.uid, &request.text)
        .await?;
    Ok(ApiResponse::created(comment))
}

async fn delete_comment(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams((id, comment_id)): PathParams<(StoryId, CommentId)>,
) -> Result<MessageResponse> {
    StoryService::new(state.store())
        .delete_comment(&id, &comment_id, &identity.uid)
        .await?;
    Ok(MessageResponse::new("Comment deleted"))
}
