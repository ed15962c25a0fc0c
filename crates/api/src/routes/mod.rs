//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                 - Liveness
//! GET  /health/ready                           - Readiness (store ping)
//!
//! # Trips (owner only)
//! GET    /api/trips?filter=all|upcoming|past   - List own trips
//! POST   /api/trips                            - Create trip
//! GET    /api/trips/{id}                       - Trip detail
//! PUT    /api/trips/{id}                       - Update trip
//! DELETE /api/trips/{id}                       - Delete trip
//! POST   /api/trips/{id}/places                - Add place
//! PUT    /api/trips/{id}/places                - Reorder places
//! DELETE /api/trips/{id}/places/{place_id}     - Remove place
//! POST   /api/trips/{id}/itinerary             - Suggest itinerary
//!
//! # Stories
//! GET    /api/stories?limit=&cursor=           - Public feed (paginated)
//! GET    /api/stories/user/{user_id}           - A user's stories
//! GET    /api/stories/{id}                     - Story detail
//! POST   /api/stories                          - Create story
//! PUT    /api/stories/{id}                     - Update story
//! DELETE /api/stories/{id}                     - Delete story
//! POST   /api/stories/{id}/like                - Toggle like
//! POST   /api/stories/{id}/comments            - Add comment
//! DELETE /api/stories/{id}/comments/{comment_id} - Delete comment
//!
//! # Users
//! GET    /api/users/me                         - Own profile (created on first access)
//! PUT    /api/users/me                         - Update own profile
//! GET    /api/users/{uid}                      - Public profile
//!
//! # Recommendations
//! GET    /api/recommendations                  - Ranked by interests
//! GET    /api/recommendations/similar/{id}     - Similar destinations
//! GET    /api/recommendations/nearby           - Within a radius
//! ```

pub mod extract;
pub mod health;
pub mod recommendations;
pub mod response;
pub mod stories;
pub mod trips;
pub mod users;

use axum::Router;

use crate::error::AppError;
use crate::state::AppState;

/// Routes mounted under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(trips::router())
        .merge(stories::router())
        .merge(users::router())
        .merge(recommendations::router())
        .fallback(not_found)
}

/// The complete router without rate limiting.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api", api_routes())
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
