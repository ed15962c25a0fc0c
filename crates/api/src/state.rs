//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::services::auth::{JwtTokenVerifier, TokenVerifier};
use crate::services::itinerary::{AiItineraryClient, ItineraryProvider};
use crate::services::{DestinationSource, ItineraryService, StoreDestinationSource};
use crate::store::DocumentStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// document store, the token verifier and the long-lived services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn DocumentStore>,
    verifier: Arc<dyn TokenVerifier>,
    destinations: Arc<dyn DestinationSource>,
    itinerary: ItineraryService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Tokens are verified as HS256 JWTs with the configured secret,
    /// destinations are read from the store, and itineraries use the
    /// generative endpoint when one is configured.
    #[must_use]
    pub fn new(config: ApiConfig, store: Arc<dyn DocumentStore>) -> Self {
        let provider = config.ai.as_ref().map(|ai| {
            let client: Arc<dyn ItineraryProvider> = Arc::new(AiItineraryClient::new(ai));
            client
        });
        let verifier = Arc::new(JwtTokenVerifier::new(&config.token_secret));
        let destinations = Arc::new(StoreDestinationSource::new(Arc::clone(&store)));

        Self::from_parts(config, store, verifier, destinations, provider)
    }

    /// Assemble state from explicit collaborators.
    #[must_use]
    pub fn from_parts(
        config: ApiConfig,
        store: Arc<dyn DocumentStore>,
        verifier: Arc<dyn TokenVerifier>,
        destinations: Arc<dyn DestinationSource>,
        provider: Option<Arc<dyn ItineraryProvider>>,
    ) -> Self {
        let itinerary = ItineraryService::new(Arc::clone(&store), provider);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                verifier,
                destinations,
                itinerary,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token verifier.
    #[must_use]
    pub fn verifier(&self) -> &dyn TokenVerifier {
        self.inner.verifier.as_ref()
    }

    /// Get a reference to the destination catalogue.
    #[must_use]
    pub fn destinations(&self) -> &dyn DestinationSource {
        self.inner.destinations.as_ref()
    }

    /// Get a reference to the itinerary service.
    #[must_use]
    pub fn itinerary(&self) -> &ItineraryService {
        &self.inner.itinerary
    }
}
