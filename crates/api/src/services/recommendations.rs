//! Destination recommendations.
//!
//! Candidates come from a [`DestinationSource`]; ranking is delegated to the
//! pure scorer in `tripnest_core::recommend`. Recommendations are a
//! best-effort feature: when the source fails the service logs a warning and
//! answers with an empty list instead of failing the request.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};
use tripnest_core::recommend::{self, NearbyDestination, RecommendationContext, ScoredDestination};
use tripnest_core::{Coordinates, Destination, DestinationId};

use super::ServiceError;
use crate::store::{DESTINATIONS, DocumentStore, Query};

/// Upper bound on candidates pulled from the catalogue per request.
const MAX_CANDIDATES: usize = 500;

/// Where candidate destinations come from.
#[async_trait]
pub trait DestinationSource: Send + Sync {
    /// Candidate destinations, in catalogue order.
    async fn candidates(&self) -> Result<Vec<Destination>, ServiceError>;

    /// A single destination.
    async fn destination(&self, id: &DestinationId) -> Result<Destination, ServiceError>;
}

/// Reads the `destinations` collection.
#[derive(Clone)]
pub struct StoreDestinationSource {
    store: Arc<dyn DocumentStore>,
}

impl StoreDestinationSource {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DestinationSource for StoreDestinationSource {
    async fn candidates(&self) -> Result<Vec<Destination>, ServiceError> {
        let query = Query::new().limit(MAX_CANDIDATES);
        let docs = self.store.query(DESTINATIONS, &query).await?;
        docs.into_iter()
            .map(|doc| doc.decode().map_err(ServiceError::from))
            .collect()
    }

    async fn destination(&self, id: &DestinationId) -> Result<Destination, ServiceError> {
        Ok(self.store.get(DESTINATIONS, id.as_str()).await?.decode()?)
    }
}

/// Ranks catalogue destinations for a user.
pub struct RecommendationService<'a> {
    source: &'a dyn DestinationSource,
}

impl<'a> RecommendationService<'a> {
    /// Create a new recommendation service.
    #[must_use]
    pub const fn new(source: &'a dyn DestinationSource) -> Self {
        Self { source }
    }

    async fn candidates_or_empty(&self) -> Vec<Destination> {
        match self.source.candidates().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Destination source unavailable, returning no recommendations");
                Vec::new()
            }
        }
    }

    /// Destinations ranked by the user's interests and travel history.
    #[instrument(skip(self, context))]
    pub async fn recommend(
        &self,
        context: &RecommendationContext,
        limit: usize,
    ) -> Vec<ScoredDestination> {
        let mut ranked = recommend::rank(self.candidates_or_empty().await, context);
        ranked.truncate(limit);
        ranked
    }

    /// Destinations most like `destination_id`, excluding itself.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the reference destination does not
    /// exist. Other source failures yield an empty list.
    #[instrument(skip(self), fields(destination_id = %destination_id))]
    pub async fn similar(
        &self,
        destination_id: &DestinationId,
        limit: usize,
    ) -> Result<Vec<ScoredDestination>, ServiceError> {
        let reference = match self.source.destination(destination_id).await {
            Ok(reference) => reference,
            Err(ServiceError::NotFound(what)) => return Err(ServiceError::NotFound(what)),
            Err(e) => {
                warn!(error = %e, "Destination source unavailable, returning no similar destinations");
                return Ok(Vec::new());
            }
        };

        let mut ranked = recommend::rank_similar(self.candidates_or_empty().await, &reference);
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Destinations within `radius_km` of `center`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for out-of-range coordinates or a
    /// non-positive radius.
    #[instrument(skip(self))]
    pub async fn nearby(
        &self,
        center: Coordinates,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<NearbyDestination>, ServiceError> {
        if !center.is_valid() {
            return Err(ServiceError::Validation(
                "latitude must be within ±90 and longitude within ±180".to_owned(),
            ));
        }
        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(ServiceError::Validation(
                "radius must be a positive number of kilometres".to_owned(),
            ));
        }

        let mut within = recommend::nearby(&center, radius_km, self.candidates_or_empty().await);
        within.truncate(limit);
        Ok(within)
    }
}
