//! Trip aggregate service.
//!
//! Trips own an ordered list of places. Every mutation loads the current
//! document, checks ownership, applies the change and writes it back through
//! the store.

use serde_json::Map;
use tracing::instrument;
use tripnest_core::{
    NewTrip, Place, PlaceId, Timestamp, Trip, TripFilter, TripId, TripPatch, UserId, assert_owner,
};

use super::ServiceError;
use crate::store::{
    Direction, Document, DocumentStore, FilterOp, Query, StoreError, TRIPS, to_partial,
};

const USER_ID: &str = "userId";
const START_DATE: &str = "startDate";
const END_DATE: &str = "endDate";
const PLACES: &str = "places";

/// Trip CRUD and place management.
pub struct TripService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> TripService<'a> {
    /// Create a new trip service.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    async fn load(&self, id: &TripId) -> Result<Trip, ServiceError> {
        Ok(self.store.get(TRIPS, id.as_str()).await?.decode()?)
    }

    async fn load_owned(&self, id: &TripId, requester: &UserId) -> Result<Trip, ServiceError> {
        let trip = self.load(id).await?;
        assert_owner(&trip, requester)?;
        Ok(trip)
    }

    async fn write_places(&self, id: &TripId, places: &[Place]) -> Result<Vec<Place>, ServiceError> {
        let mut partial = Map::new();
        partial.insert(
            PLACES.to_owned(),
            serde_json::to_value(places).map_err(StoreError::from)?,
        );
        let trip: Trip = self.store.update(TRIPS, id.as_str(), partial).await?.decode()?;
        Ok(trip.places)
    }

    // =========================================================================
    // Trips
    // =========================================================================

    /// List a user's trips.
    ///
    /// - `All`: ascending by start date
    /// - `Upcoming`: start date now or later, ascending by start date
    /// - `Past`: end date before now, descending by end date
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Store` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_trips(
        &self,
        user_id: &UserId,
        filter: TripFilter,
    ) -> Result<Vec<Trip>, ServiceError> {
        let now = Timestamp::now().to_wire();
        let query = Query::new().filter(USER_ID, FilterOp::Eq, user_id.as_str());
        let query = match filter {
            TripFilter::All => query.order_by(START_DATE, Direction::Ascending),
            TripFilter::Upcoming => query
                .filter(START_DATE, FilterOp::Gte, now)
                .order_by(START_DATE, Direction::Ascending),
            TripFilter::Past => query
                .filter(END_DATE, FilterOp::Lt, now)
                .order_by(END_DATE, Direction::Descending),
        };

        let docs = self.store.query(TRIPS, &query).await?;
        docs.into_iter()
            .map(|doc| doc.decode().map_err(ServiceError::from))
            .collect()
    }

    /// Fetch a trip. Visibility is decided by the caller.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the trip does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_trip(&self, id: &TripId) -> Result<Trip, ServiceError> {
        self.load(id).await
    }

    /// Create a trip owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the title is blank or place ids repeat.
    #[instrument(skip(self, new_trip), fields(user_id = %user_id))]
    pub async fn create_trip(
        &self,
        user_id: &UserId,
        new_trip: NewTrip,
    ) -> Result<Trip, ServiceError> {
        new_trip.validate().map_err(ServiceError::Validation)?;

        let now = Timestamp::now();
        let trip = Trip {
            id: TripId::generate(),
            user_id: user_id.clone(),
            title: new_trip.title.trim().to_owned(),
            location: new_trip.location,
            coordinates: new_trip.coordinates,
            start_date: new_trip.start_date,
            end_date: new_trip.end_date,
            trip_type: new_trip.trip_type,
            budget: new_trip.budget,
            places: new_trip.places,
            created_at: now,
            updated_at: now,
        };

        let id = self.store.put(TRIPS, Document::from_entity(&trip)?).await?;
        tracing::info!(trip_id = %id, "Trip created");
        self.load(&TripId::new(id)).await
    }

    /// Merge `patch` into a trip the requester owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` if the requester is not the owner
    /// (the stored trip is left unchanged), `ServiceError::NotFound` if the
    /// trip does not exist.
    #[instrument(skip(self, patch), fields(id = %id, requester = %requester))]
    pub async fn update_trip(
        &self,
        id: &TripId,
        requester: &UserId,
        patch: TripPatch,
    ) -> Result<Trip, ServiceError> {
        patch.validate().map_err(ServiceError::Validation)?;
        self.load_owned(id, requester).await?;

        let doc = self
            .store
            .update(TRIPS, id.as_str(), to_partial(&patch)?)
            .await?;
        Ok(doc.decode()?)
    }

    /// Delete a trip the requester owns. Stories are not affected.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the trip does not exist (including
    /// a second delete), `ServiceError::Forbidden` for non-owners.
    #[instrument(skip(self), fields(id = %id, requester = %requester))]
    pub async fn delete_trip(&self, id: &TripId, requester: &UserId) -> Result<(), ServiceError> {
        self.load_owned(id, requester).await?;
        self.store.delete(TRIPS, id.as_str()).await?;
        tracing::info!("Trip deleted");
        Ok(())
    }

    // =========================================================================
    // Places
    // =========================================================================

    /// Append a place to the end of the visit order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` if a place with the same id exists.
    #[instrument(skip(self, place), fields(trip_id = %trip_id, place_id = %place.id))]
    pub async fn add_place(
        &self,
        trip_id: &TripId,
        requester: &UserId,
        place: Place,
    ) -> Result<Vec<Place>, ServiceError> {
        let trip = self.load_owned(trip_id, requester).await?;
        if trip.place(&place.id).is_some() {
            return Err(ServiceError::Conflict(format!(
                "place {} already exists in this trip",
                place.id
            )));
        }

        let mut places = trip.places;
        places.push(place);
        self.write_places(trip_id, &places).await
    }

    /// Remove a place. Removing a place that is not there is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for non-owners.
    #[instrument(skip(self), fields(trip_id = %trip_id, place_id = %place_id))]
    pub async fn remove_place(
        &self,
        trip_id: &TripId,
        requester: &UserId,
        place_id: &PlaceId,
    ) -> Result<Vec<Place>, ServiceError> {
        let trip = self.load_owned(trip_id, requester).await?;
        let before = trip.places.len();
        let places: Vec<Place> = trip
            .places
            .into_iter()
            .filter(|p| &p.id != place_id)
            .collect();

        if places.len() == before {
            return Ok(places);
        }
        self.write_places(trip_id, &places).await
    }

    /// Replace the visit order with `places`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` unless the supplied ids are exactly
    /// the stored ids in some order.
    #[instrument(skip(self, places), fields(trip_id = %trip_id))]
    pub async fn reorder_places(
        &self,
        trip_id: &TripId,
        requester: &UserId,
        places: Vec<Place>,
    ) -> Result<Vec<Place>, ServiceError> {
        let trip = self.load_owned(trip_id, requester).await?;

        let mut stored: Vec<&PlaceId> = trip.places.iter().map(|p| &p.id).collect();
        let mut supplied: Vec<&PlaceId> = places.iter().map(|p| &p.id).collect();
        stored.sort();
        supplied.sort();
        if stored != supplied {
            return Err(ServiceError::Validation(
                "places must contain exactly the trip's existing places".to_owned(),
            ));
        }

        self.write_places(trip_id, &places).await
    }
}
