use std::collections::BTreeSet;

use serde::Serialize;

use crate::places::Place;
use crate::utils::geo::{is_within_radius, Coordinates};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceFilter {
    pub sources: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    /// Free-text search over names, category, address and broadcasts.
    pub query: Option<String>,
}

impl PlaceFilter {
    pub fn is_active(&self) -> bool {
        !self.sources.is_empty() || !self.categories.is_empty() || self.query.is_some()
    }

    pub fn matches(&self, place: &Place) -> bool {
        if !self.sources.is_empty()
            && !place
                .broadcasts
                .iter()
                .any(|b| self.sources.contains(&b.source_name))
        {
            return false;
        }

        if !self.categories.is_empty() && !self.categories.contains(&place.category) {
            return false;
        }

        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => matches_query(place, &q.to_lowercase()),
            _ => true,
        }
    }
}

fn matches_query(place: &Place, needle: &str) -> bool {
    let hit = |s: &str| s.to_lowercase().contains(needle);

    hit(&place.restaurant_name)
        || hit(&place.category)
        || hit(&place.address)
        || place.broadcasts.iter().any(|b| {
            hit(&b.source_name) || b.title.as_deref().is_some_and(|t| hit(t))
        })
}

pub fn apply_filters(places: Vec<Place>, filter: &PlaceFilter) -> Vec<Place> {
    places.into_iter().filter(|p| filter.matches(p)).collect()
}

/// Attach distances from `origin` and sort nearest first. Places beyond
/// `radius_km` are dropped. Without an origin the input order is kept and
/// no distances are set.
pub fn rank_by_distance(
    places: Vec<Place>,
    origin: Option<Coordinates>,
    radius_km: Option<f64>,
) -> Vec<Place> {
    let Some(origin) = origin else {
        return places;
    };

    let mut ranked: Vec<Place> = places
        .into_iter()
        .filter(|p| match radius_km {
            Some(radius) => is_within_radius(p.lat, p.lng, origin.lat, origin.lng, radius),
            None => true,
        })
        .map(|mut p| {
            p.distance = Some(origin.distance_to(&p.coordinates()));
            p
        })
        .collect();

    ranked.sort_by(|a, b| {
        let a = a.distance.unwrap_or(f64::INFINITY);
        let b = b.distance.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
    ranked
}

pub fn filter_and_rank(
    places: Vec<Place>,
    filter: &PlaceFilter,
    origin: Option<Coordinates>,
    radius_km: Option<f64>,
) -> Vec<Place> {
    rank_by_distance(apply_filters(places, filter), origin, radius_km)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AvailableFilters {
    pub sources: Vec<String>,
    pub categories: Vec<String>,
}

/// Distinct source names and non-empty categories, sorted.
pub fn available_filters(places: &[Place]) -> AvailableFilters {
    let sources: BTreeSet<&str> = places
        .iter()
        .flat_map(|p| p.broadcasts.iter().map(|b| b.source_name.as_str()))
        .collect();
    let categories: BTreeSet<&str> = places
        .iter()
        .map(|p| p.category.trim())
        .filter(|c| !c.is_empty())
        .collect();

    AvailableFilters {
        sources: sources.into_iter().map(String::from).collect(),
        categories: categories.into_iter().map(String::from).collect(),
    }
}
