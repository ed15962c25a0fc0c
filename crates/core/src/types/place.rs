//! Places embedded in a trip's itinerary.

use serde::{Deserialize, Serialize};

use super::{Coordinates, PlaceId};

/// Kind of place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    #[serde(alias = "Restaurant")]
    Restaurant,
    #[serde(alias = "Attraction")]
    Attraction,
    #[serde(alias = "Hotel")]
    Hotel,
    #[default]
    #[serde(alias = "Other")]
    Other,
}

/// A stop on a trip.
///
/// Places are not top-level documents: they live inside `Trip::places`, whose
/// order is the visit order. An incoming place without an `id` gets a freshly
/// generated one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default = "PlaceId::generate")]
    pub id: PlaceId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub place_type: PlaceType,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Place {
    /// A bare place with only an id and a name.
    #[must_use]
    pub fn named(id: impl Into<PlaceId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            place_type: PlaceType::Other,
            address: String::new(),
            coordinates: None,
            notes: None,
        }
    }
}
