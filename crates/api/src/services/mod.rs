//! Business logic services for the API.
//!
//! # Services
//!
//! - `trips` - Trip CRUD and place management (owner-only mutations)
//! - `stories` - Story CRUD, public feed, likes and comments
//! - `profiles` - Lazily created user profiles with derived stats
//! - `recommendations` - Destination ranking, similarity and proximity
//! - `itinerary` - Cached day-by-day plans, generative with rule-based fallback
//! - `auth` - Bearer token verification
//!
//! Services borrow a [`DocumentStore`](crate::store::DocumentStore) and are
//! constructed per request; they hold no state of their own.

pub mod auth;
mod error;
pub mod itinerary;
pub mod profiles;
pub mod recommendations;
pub mod stories;
pub mod trips;

pub use error::ServiceError;
pub use itinerary::ItineraryService;
pub use profiles::ProfileService;
pub use recommendations::{DestinationSource, RecommendationService, StoreDestinationSource};
pub use stories::StoryService;
pub use trips::TripService;
