//! Core types for Tripnest.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! document shapes stored in the `trips`, `stories`, `users` and
//! `destinations` collections.

pub mod destination;
pub mod geo;
pub mod id;
pub mod place;
pub mod profile;
pub mod story;
pub mod timestamp;
pub mod trip;

mod patch;

pub use destination::Destination;
pub use geo::{Coordinates, EARTH_RADIUS_KM};
pub use id::*;
pub use place::{Place, PlaceType};
pub use profile::{ProfilePatch, ProfileStats, PublicProfile, UserProfile};
pub use story::{Comment, LikeStatus, NewStory, Story, StoryPatch};
pub use timestamp::{Timestamp, TimestampError};
pub use trip::{Budget, NewTrip, Trip, TripFilter, TripPatch, TripType};
