//! Recommendation route handlers.
//!
//! List parameters are comma-separated: `?interests=food,wine&visited=FR,IT`.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;
use tripnest_core::recommend::{NearbyDestination, RecommendationContext, ScoredDestination};
use tripnest_core::{Coordinates, DestinationId};

use super::extract::{PathParams, QueryParams};
use super::response::ApiResponse;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::RecommendationService;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;
const DEFAULT_RADIUS_KM: f64 = 100.0;

/// Build the recommendations router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recommendations", get(recommend))
        .route("/recommendations/similar/{id}", get(similar))
        .route("/recommendations/nearby", get(nearby))
}

#[derive(Debug, Deserialize)]
struct RecommendQuery {
    interests: Option<String>,
    visited: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct NearbyQuery {
    lat: f64,
    lon: f64,
    radius: Option<f64>,
    limit: Option<usize>,
}

fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

async fn recommend(
    RequireAuth(_identity): RequireAuth,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<RecommendQuery>,
) -> Result<ApiResponse<Vec<ScoredDestination>>> {
    let context = RecommendationContext {
        user_interests: split_csv(query.interests.as_deref()),
        visited_countries: split_csv(query.visited.as_deref()),
    };
    let ranked = RecommendationService::new(state.destinations())
        .recommend(&context, clamp_limit(query.limit))
        .await;
    Ok(ApiResponse::ok(ranked))
}

async fn similar(
    RequireAuth(_identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<DestinationId>,
    QueryParams(query): QueryParams<LimitQuery>,
) -> Result<ApiResponse<Vec<ScoredDestination>>> {
    let ranked = RecommendationService::new(state.destinations())
        .similar(&id, clamp_limit(query.limit))
        .await?;
    Ok(ApiResponse::ok(ranked))
}

async fn nearby(
    RequireAuth(_identity): RequireAuth,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<NearbyQuery>,
) -> Result<ApiResponse<Vec<NearbyDestination>>> {
    let within = RecommendationService::new(state.destinations())
        .nearby(
            Coordinates::new(query.lat, query.lon),
            query.radius.unwrap_or(DEFAULT_RADIUS_KM),
            clamp_limit(query.limit),
        )
        .await?;
    Ok(ApiResponse::ok(within))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_csv_trims_and_drops_blanks() {
        assert_eq!(split_csv(Some(" food, wine,,")), ["food", "wine"]);
        assert!(split_csv(None).is_empty());
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(500)), MAX_LIMIT);
    }
}
