//! Trips: the owner-scoped aggregate holding an ordered list of places.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::patch::present;
use super::{Coordinates, Place, Timestamp, TripId, UserId};
use crate::access::Owned;

/// Who is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    #[default]
    #[serde(alias = "Solo")]
    Solo,
    #[serde(alias = "Friends")]
    Friends,
    #[serde(alias = "Family")]
    Family,
    #[serde(alias = "Couple")]
    Couple,
}

impl TripType {
    /// Headcount assumed when estimating a budget.
    #[must_use]
    pub const fn travellers(self) -> u32 {
        match self {
            Self::Solo => 1,
            Self::Couple => 2,
            Self::Friends | Self::Family => 4,
        }
    }
}

/// Spending tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    #[serde(alias = "Budget")]
    Budget,
    #[default]
    #[serde(alias = "Moderate")]
    Moderate,
    #[serde(alias = "Luxury")]
    Luxury,
}

/// Date filter for listing a user's trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripFilter {
    /// Every trip, ascending by start date.
    #[default]
    All,
    /// Trips starting now or later, ascending by start date.
    Upcoming,
    /// Trips that ended before now, descending by end date.
    Past,
}

impl FromStr for TripFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "upcoming" => Ok(Self::Upcoming),
            "past" => Ok(Self::Past),
            other => Err(format!("invalid trip filter: {other}")),
        }
    }
}

/// A stored trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: TripId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub places: Vec<Place>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Trip {
    /// Look up an embedded place by id.
    #[must_use]
    pub fn place(&self, id: &super::PlaceId) -> Option<&Place> {
        self.places.iter().find(|p| &p.id == id)
    }
}

impl Owned for Trip {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

/// Fields a client supplies when creating a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTrip {
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub places: Vec<Place>,
}

impl NewTrip {
    /// Check required fields and place id uniqueness.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_owned());
        }
        let mut seen = HashSet::new();
        for place in &self.places {
            if !seen.insert(&place.id) {
                return Err(format!("duplicate place id: {}", place.id));
            }
        }
        Ok(())
    }
}

/// The updatable subset of a trip.
///
/// Unknown fields are rejected at deserialization, so `id`, `userId`,
/// `places`, `createdAt` and `updatedAt` can never be set through an update.
/// Absent fields are retained; `coordinates: null` clears the coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TripPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub coordinates: Option<Option<Coordinates>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<TripType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
}

impl TripPatch {
    /// Reject a patch that would blank the title.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message if the title is present but blank.
    pub fn validate(&self) -> Result<(), String> {
        match &self.title {
            Some(title) if title.trim().is_empty() => Err("title cannot be empty".to_owned()),
            _ => Ok(()),
        }
    }
}
