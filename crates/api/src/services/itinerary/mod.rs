//! Day-by-day itinerary suggestions for a trip.
//!
//! When a generative provider is configured the service asks it first; any
//! provider failure falls back to a rule-based plan. Suggestions are cached
//! per `(trip id, updatedAt)` for 10 minutes, so editing the trip naturally
//! invalidates its cached plan.
//!
//! # Rule-based plan
//!
//! - one day per calendar day from start to end date (1 to 30 days)
//! - places split in visit order into contiguous chunks, one chunk per day
//! - budget: per-person daily rate x travellers x days
//!
//! | Budget | Daily rate (USD) |
//! |---|---|
//! | budget | 60 |
//! | moderate | 150 |
//! | luxury | 400 |

mod client;

pub use client::{AiItineraryClient, ItineraryError};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use tripnest_core::{Budget, Timestamp, Trip, TripId, UserId, assert_owner};

use super::{ServiceError, TripService};
use crate::store::DocumentStore;

const MAX_DAYS: usize = 30;
const CACHE_TTL: Duration = Duration::from_secs(600);
const CACHE_CAPACITY: u64 = 1000;
const CURRENCY: &str = "USD";

/// Who produced the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItinerarySource {
    Ai,
    Rules,
}

/// One day of the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    /// 1-based day number.
    pub day: u32,
    pub date: NaiveDate,
    /// Place names, in visit order.
    pub places: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEstimate {
    pub per_day: Decimal,
    pub total: Decimal,
    pub currency: String,
}

/// A suggested itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub source: ItinerarySource,
    pub days: Vec<ItineraryDay>,
    pub estimated_budget: BudgetEstimate,
    pub summary: String,
}

/// A generative itinerary backend.
#[async_trait]
pub trait ItineraryProvider: Send + Sync {
    /// Produce a plan for `trip`.
    async fn generate(&self, trip: &Trip) -> Result<Itinerary, ItineraryError>;
}

// =============================================================================
// Rule-based planning
// =============================================================================

const fn daily_rate(budget: Budget) -> u32 {
    match budget {
        Budget::Budget => 60,
        Budget::Moderate => 150,
        Budget::Luxury => 400,
    }
}

/// Calendar days covered by the trip, clamped to 1..=30.
#[must_use]
pub fn trip_days(trip: &Trip) -> usize {
    let start = trip.start_date.as_datetime().date_naive();
    let end = trip.end_date.as_datetime().date_naive();
    let days = (end - start).num_days() + 1;
    usize::try_from(days).unwrap_or(1).clamp(1, MAX_DAYS)
}

/// Per-person daily rate x travellers x days.
#[must_use]
pub fn estimate_budget(trip: &Trip, days: usize) -> BudgetEstimate {
    let per_day = Decimal::from(daily_rate(trip.budget)) * Decimal::from(trip.trip_type.travellers());
    let total = per_day * Decimal::from(days);
    BudgetEstimate {
        per_day,
        total,
        currency: CURRENCY.to_owned(),
    }
}

/// Build a plan from the trip alone.
#[must_use]
pub fn plan_with_rules(trip: &Trip) -> Itinerary {
    let days = trip_days(trip);
    let chunk = trip.places.len().div_ceil(days).max(1);
    let mut chunks = trip.places.chunks(chunk);
    let start = trip.start_date.as_datetime().date_naive();

    let plan: Vec<ItineraryDay> = (0..days)
        .map(|offset| ItineraryDay {
            day: u32::try_from(offset + 1).unwrap_or(u32::MAX),
            date: start + chrono::Days::new(u64::try_from(offset).unwrap_or_default()),
            places: chunks
                .next()
                .map(|places| places.iter().map(|p| p.name.clone()).collect())
                .unwrap_or_default(),
        })
        .collect();

    let travellers = trip.trip_type.travellers();
    let summary = format!(
        "{days}-day trip to {} for {travellers} traveller{} with {} planned stop{}",
        if trip.location.is_empty() {
            &trip.title
        } else {
            &trip.location
        },
        if travellers == 1 { "" } else { "s" },
        trip.places.len(),
        if trip.places.len() == 1 { "" } else { "s" },
    );

    Itinerary {
        source: ItinerarySource::Rules,
        days: plan,
        estimated_budget: estimate_budget(trip, days),
        summary,
    }
}

// =============================================================================
// ItineraryService
// =============================================================================

/// Cached itinerary suggestions.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct ItineraryService {
    inner: Arc<ItineraryServiceInner>,
}

struct ItineraryServiceInner {
    store: Arc<dyn DocumentStore>,
    provider: Option<Arc<dyn ItineraryProvider>>,
    cache: Cache<(TripId, Timestamp), Itinerary>,
}

impl ItineraryService {
    /// Create a new itinerary service. Without a provider every plan is
    /// rule-based.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        provider: Option<Arc<dyn ItineraryProvider>>,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ItineraryServiceInner {
                store,
                provider,
                cache,
            }),
        }
    }

    /// Suggest an itinerary for a trip the requester owns.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the trip does not exist,
    /// `ServiceError::Forbidden` for non-owners. Provider failures are not
    /// errors; they fall back to the rule-based plan.
    #[instrument(skip(self), fields(trip_id = %trip_id, requester = %requester))]
    pub async fn suggest(
        &self,
        trip_id: &TripId,
        requester: &UserId,
    ) -> Result<Itinerary, ServiceError> {
        let trip = TripService::new(self.inner.store.as_ref())
            .get_trip(trip_id)
            .await?;
        assert_owner(&trip, requester)?;

        let key = (trip.id.clone(), trip.updated_at);
        if let Some(cached) = self.inner.cache.get(&key).await {
            debug!("Itinerary cache hit");
            return Ok(cached);
        }

        let itinerary = match &self.inner.provider {
            Some(provider) => match provider.generate(&trip).await {
                Ok(itinerary) => itinerary,
                Err(e) => {
                    warn!(error = %e, "Itinerary provider failed, using rule-based plan");
                    plan_with_rules(&trip)
                }
            },
            None => plan_with_rules(&trip),
        };

        self.inner.cache.insert(key, itinerary.clone()).await;
        Ok(itinerary)
    }
}
