use serde::{Deserialize, Serialize};
use serde_json::Value;

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }

    /// GeoJSON point, the shape restaurant locations are written in.
    pub fn to_geojson(&self) -> Value {
        serde_json::json!({
            "type": "Point",
            "coordinates": [self.lng, self.lat],
        })
    }
}

/// Calculate distance between two coordinates using Haversine formula
/// Returns distance in kilometers
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Check if a place lies within `max_radius_km` of a center point
pub fn is_within_radius(
    lat: f64,
    lng: f64,
    center_lat: f64,
    center_lng: f64,
    max_radius_km: f64,
) -> bool {
    haversine_distance(lat, lng, center_lat, center_lng) <= max_radius_km
}

/// Human readable distance: metres below one kilometre, otherwise one decimal of km.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round() as i64)
    } else {
        format!("{:.1}km", km)
    }
}

/// Outcome of reading a stored location value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLocation {
    Point(Coordinates),
    Unparseable(String),
}

impl ParsedLocation {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            ParsedLocation::Point(c) => Some(*c),
            ParsedLocation::Unparseable(_) => None,
        }
    }
}

/// Parse a stored location.
///
/// Accepts a GeoJSON point (`{"type":"Point","coordinates":[lng,lat]}`),
/// a WKT string (`POINT(lng lat)`, optionally prefixed with `SRID=4326;`)
/// or a plain `{"lat":..,"lng":..}` object. Anything else, including
/// non-finite numbers, is reported as unparseable.
pub fn parse_location(value: &Value) -> ParsedLocation {
    let parsed = match value {
        Value::Object(map) if map.contains_key("coordinates") => {
            match map.get("coordinates").and_then(Value::as_array) {
                Some(pair) if pair.len() >= 2 => match (pair[0].as_f64(), pair[1].as_f64()) {
                    (Some(lng), Some(lat)) => Ok(Coordinates::new(lat, lng)),
                    _ => Err("GeoJSON coordinates are not numbers".to_string()),
                },
                _ => Err("GeoJSON coordinates must be a [lng, lat] array".to_string()),
            }
        }
        Value::Object(map) => match (
            map.get("lat").and_then(Value::as_f64),
            map.get("lng").and_then(Value::as_f64),
        ) {
            (Some(lat), Some(lng)) => Ok(Coordinates::new(lat, lng)),
            _ => Err("object has no numeric lat/lng".to_string()),
        },
        Value::String(s) => parse_wkt_point(s),
        other => Err(format!("unsupported location value: {}", other)),
    };

    match parsed {
        Ok(c) if c.is_finite() => ParsedLocation::Point(c),
        Ok(_) => ParsedLocation::Unparseable("coordinates are not finite".to_string()),
        Err(reason) => ParsedLocation::Unparseable(reason),
    }
}

fn parse_wkt_point(raw: &str) -> Result<Coordinates, String> {
    let s = raw.trim();
    let s = match s.split_once(';') {
        Some((srid, rest)) if srid.trim().to_ascii_uppercase().starts_with("SRID=") => rest.trim(),
        _ => s,
    };

    let body = s
        .strip_prefix("POINT")
        .or_else(|| s.strip_prefix("point"))
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| format!("not a WKT point: {}", raw))?;

    let mut parts = body.split_whitespace();
    let (Some(lng), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("WKT point needs exactly two numbers: {}", raw));
    };

    let lng: f64 = lng.parse().map_err(|_| format!("invalid longitude: {}", lng))?;
    let lat: f64 = lat.parse().map_err(|_| format!("invalid latitude: {}", lat))?;
    Ok(Coordinates::new(lat, lng))
}
