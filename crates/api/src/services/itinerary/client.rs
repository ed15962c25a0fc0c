//! HTTP client for the generative itinerary endpoint.
//!
//! Sends the trip outline as JSON with a bearer key and expects
//! `{days: [{day, date, places}], summary, estimatedBudget?}` back. A missing
//! budget is filled in with the rule-based estimate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use tripnest_core::{Budget, Trip, TripType};

use super::{
    BudgetEstimate, Itinerary, ItineraryDay, ItineraryProvider, ItinerarySource, estimate_budget,
    trip_days,
};
use crate::config::AiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors from the itinerary endpoint.
#[derive(Debug, Error)]
pub enum ItineraryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("itinerary endpoint returned HTTP {0}")]
    Status(u16),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The endpoint answered without any days.
    #[error("itinerary endpoint returned an empty plan")]
    Empty,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    title: &'a str,
    location: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    days: usize,
    trip_type: TripType,
    budget: Budget,
    places: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    days: Vec<ItineraryDay>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    estimated_budget: Option<BudgetEstimate>,
}

/// Client for the configured generative endpoint.
#[derive(Clone)]
pub struct AiItineraryClient {
    inner: Arc<AiItineraryClientInner>,
}

struct AiItineraryClientInner {
    client: reqwest::Client,
    endpoint: url::Url,
    api_key: SecretString,
}

impl AiItineraryClient {
    /// Create a new itinerary client.
    #[must_use]
    pub fn new(config: &AiConfig) -> Self {
        Self {
            inner: Arc::new(AiItineraryClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                api_key: config.api_key.clone(),
            }),
        }
    }
}

#[async_trait]
impl ItineraryProvider for AiItineraryClient {
    #[instrument(skip(self, trip), fields(trip_id = %trip.id))]
    async fn generate(&self, trip: &Trip) -> Result<Itinerary, ItineraryError> {
        let days = trip_days(trip);
        let request = GenerateRequest {
            title: &trip.title,
            location: &trip.location,
            start_date: trip.start_date.as_datetime().date_naive(),
            end_date: trip.end_date.as_datetime().date_naive(),
            days,
            trip_type: trip.trip_type,
            budget: trip.budget,
            places: trip.places.iter().map(|p| p.name.as_str()).collect(),
        };

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .bearer_auth(self.inner.api_key.expose_secret())
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ItineraryError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let generated: GenerateResponse = serde_json::from_str(&body)?;
        if generated.days.is_empty() {
            return Err(ItineraryError::Empty);
        }

        debug!(days = generated.days.len(), "Itinerary generated");

        Ok(Itinerary {
            source: ItinerarySource::Ai,
            days: generated.days,
            estimated_budget: generated
                .estimated_budget
                .unwrap_or_else(|| estimate_budget(trip, days)),
            summary: generated.summary,
        })
    }
}
