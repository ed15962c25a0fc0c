//! Trip route handlers. Every route is owner-scoped.

use axum::{
    Router,
    extract::State,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tripnest_core::{NewTrip, Place, PlaceId, Trip, TripFilter, TripId, TripPatch, assert_owner};

use super::extract::{JsonBody, PathParams, QueryParams};
use super::response::{ApiResponse, MessageResponse};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::{ServiceError, TripService};
use crate::services::itinerary::Itinerary;
use crate::state::AppState;

/// Build the trips router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list).post(create))
        .route("/trips/{id}", get(show).put(update).delete(destroy))
        .route("/trips/{id}/places", post(add_place).put(reorder_places))
        .route("/trips/{id}/places/{place_id}", delete(remove_place))
        .route("/trips/{id}/itinerary", post(itinerary))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    filter: Option<String>,
}

impl ListQuery {
    /// `all`, `upcoming` or `past`, case-insensitive. Absent or empty means `all`.
    fn filter(&self) -> Result<TripFilter> {
        self.filter
            .as_deref()
            .map_or(Ok(TripFilter::All), str::parse)
            .map_err(AppError::BadRequest)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReorderRequest {
    places: Vec<Place>,
}

async fn list(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<ApiResponse<Vec<Trip>>> {
    let trips = TripService::new(state.store())
        .list_trips(&identity.uid, query.filter()?)
        .await?;
    Ok(ApiResponse::ok(trips))
}

async fn show(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<TripId>,
) -> Result<ApiResponse<Trip>> {
    let trip = TripService::new(state.store()).get_trip(&id).await?;
    assert_owner(&trip, &identity.uid).map_err(ServiceError::from)?;
    Ok(ApiResponse::ok(trip))
}

async fn create(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    JsonBody(new_trip): JsonBody<NewTrip>,
) -> Result<ApiResponse<Trip>> {
    let trip = TripService::new(state.store())
        .create_trip(&identity.uid, new_trip)
        .await?;
    Ok(ApiResponse::created(trip))
}

async fn update(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<TripId>,
    JsonBody(patch): JsonBody<TripPatch>,
) -> Result<ApiResponse<Trip>> {
    let trip = TripService::new(state.store())
        .update_trip(&id, &identity.uid, patch)
        .await?;
    Ok(ApiResponse::ok(trip))
}

async fn destroy(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<TripId>,
) -> Result<MessageResponse> {
    TripService::new(state.store())
        .delete_trip(&id, &identity.uid)
        .await?;
    Ok(MessageResponse::new("Trip deleted"))
}

async fn add_place(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<TripId>,
    JsonBody(place): JsonBody<Place>,
) -> Result<ApiResponse<Vec<Place>>> {
    let places = TripService::new(state.store())
        .add_place(&id, &identity.uid, place)
        .await?;
    Ok(ApiResponse::ok(places))
}

async fn remove_place(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams((id, place_id)): PathParams<(TripId, PlaceId)>,
) -> Result<ApiResponse<Vec<Place>>> {
    let places = TripService::new(state.store())
        .remove_place(&id, &identity.uid, &place_id)
        .await?;
    Ok(ApiResponse::ok(places))
}

async fn reorder_places(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<TripId>,
    JsonBody(request): JsonBody<ReorderRequest>,
) -> Result<ApiResponse<Vec<Place>>> {
    let places = TripService::new(state.store())
        .reorder_places(&id, &identity.uid, request.places)
        .await?;
    Ok(ApiResponse::ok(places))
}

async fn itinerary(
    RequireAuth(identity): RequireAuth,
    State(state): State<AppState>,
    PathParams(id): PathParams<TripId>,
) -> Result<ApiResponse<Itinerary>> {
    let itinerary = state.itinerary().suggest(&id, &identity.uid).await?;
    Ok(ApiResponse::ok(itinerary))
}
