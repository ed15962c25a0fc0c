//! Destination scoring.
//!
//! Pure functions: the same inputs always give the same scores and the same
//! order. Sorting is stable, so candidates with equal scores keep the order
//! in which the caller supplied them (the query order).
//!
//! # Scoring
//!
//! | Term | Personal (`score`) | Similar (`similarity_score`) |
//! |---|---|---|
//! | shared tag | +2 per tag in user interests | +2 per tag shared with the reference |
//! | country | +1 if visited before | +1 if same country as the reference |
//! | popularity | + rating / 2 | + rating / 2 |
//! | rating closeness | - | +1 if ratings differ by < 0.5 |

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Coordinates, Destination};

/// What the recommender knows about the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationContext {
    #[serde(default)]
    pub user_interests: Vec<String>,
    #[serde(default)]
    pub visited_countries: Vec<String>,
}

/// A destination with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredDestination {
    #[serde(flatten)]
    pub destination: Destination,
    pub score: f64,
}

/// A destination with its distance from the search centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyDestination {
    #[serde(flatten)]
    pub destination: Destination,
    pub distance_km: f64,
}

fn normalized(values: &[String]) -> HashSet<String> {
    values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[allow(clippy::cast_precision_loss)] // tag counts are tiny
fn shared_tag_points(candidate: &Destination, tags: &HashSet<String>) -> f64 {
    let shared = normalized(&candidate.tags).intersection(tags).count();
    2.0 * shared as f64
}

fn same_country(a: &str, b: &str) -> bool {
    !a.trim().is_empty() && a.trim().eq_ignore_ascii_case(b.trim())
}

fn popularity(candidate: &Destination) -> f64 {
    candidate.rating.unwrap_or(0.0) / 2.0
}

/// Personal relevance of `candidate` for the user in `context`.
#[must_use]
pub fn score(candidate: &Destination, context: &RecommendationContext) -> f64 {
    let interests = normalized(&context.user_interests);
    let mut total = shared_tag_points(candidate, &interests);

    if context
        .visited_countries
        .iter()
        .any(|c| same_country(&candidate.country, c))
    {
        total += 1.0;
    }

    total + popularity(candidate)
}

/// Similarity of `candidate` to `reference`.
#[must_use]
pub fn similarity_score(candidate: &Destination, reference: &Destination) -> f64 {
    let reference_tags = normalized(&reference.tags);
    let mut total = shared_tag_points(candidate, &reference_tags);

    if same_country(&candidate.country, &reference.country) {
        total += 1.0;
    }

    total += popularity(candidate);

    if let (Some(a), Some(b)) = (candidate.rating, reference.rating)
        && (a - b).abs() < 0.5
    {
        total += 1.0;
    }

    total
}

fn sort_descending(scored: &mut [ScoredDestination]) {
    // `sort_by` is stable: ties keep query order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Rank candidates by personal score, best first.
#[must_use]
pub fn rank(candidates: Vec<Destination>, context: &RecommendationContext) -> Vec<ScoredDestination> {
    let mut scored: Vec<ScoredDestination> = candidates
        .into_iter()
        .map(|destination| {
            let score = score(&destination, context);
            ScoredDestination { destination, score }
        })
        .collect();
    sort_descending(&mut scored);
    scored
}

/// Rank candidates by similarity to `reference`, best first. The reference
/// itself is excluded.
#[must_use]
pub fn rank_similar(candidates: Vec<Destination>, reference: &Destination) -> Vec<ScoredDestination> {
    let mut scored: Vec<ScoredDestination> = candidates
        .into_iter()
        .filter(|d| d.id != reference.id)
        .map(|destination| {
            let score = similarity_score(&destination, reference);
            ScoredDestination { destination, score }
        })
        .collect();
    sort_descending(&mut scored);
    scored
}

/// Candidates within `radius_km` of `center`, nearest first. Candidates
/// without coordinates are skipped.
#[must_use]
pub fn nearby(
    center: &Coordinates,
    radius_km: f64,
    candidates: Vec<Destination>,
) -> Vec<NearbyDestination> {
    let mut within: Vec<NearbyDestination> = candidates
        .into_iter()
        .filter_map(|destination| {
            let distance_km = center.distance_km(destination.coordinates.as_ref()?);
            (distance_km <= radius_km).then_some(NearbyDestination {
                destination,
                distance_km,
            })
        })
        .collect();
    within.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    within
}
