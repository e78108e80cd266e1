use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::{headers::UserAgent, TypedHeader};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::links::{plan, DispatchPlan, MapApp, MapLinkParams, Platform};
use crate::places::{
    available_filters, filter_and_rank, query, AvailableFilters, Place, PlaceDetail, PlaceFilter,
};
use crate::utils::geo::Coordinates;
use crate::AppState;

/// Initial map viewport handed to the map SDK.
const DEFAULT_CENTER: Coordinates = Coordinates { lat: 37.3595704, lng: 127.105399 };
const DEFAULT_ZOOM: u8 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct PlacesQuery {
    /// Comma separated source names
    pub sources: Option<String>,
    /// Comma separated categories
    pub categories: Option<String>,
    pub q: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

impl PlacesQuery {
    pub fn filter(&self) -> PlaceFilter {
        PlaceFilter {
            sources: split_list(self.sources.as_deref()),
            categories: split_list(self.categories.as_deref()),
            query: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from),
        }
    }

    pub fn origin(&self) -> AppResult<Option<Coordinates>> {
        coordinates_param(self.lat, self.lng, "lat/lng")
    }

    pub fn radius(&self) -> AppResult<Option<f64>> {
        match self.radius_km {
            Some(r) if !r.is_finite() || r <= 0.0 => {
                Err(AppError::BadRequest("radius_km must be positive".to_string()))
            }
            other => Ok(other),
        }
    }
}

fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Both halves of a coordinate pair or neither.
pub(crate) fn coordinates_param(lat: Option<f64>, lng: Option<f64>, name: &str) -> AppResult<Option<Coordinates>> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            let c = Coordinates::new(lat, lng);
            if !c.is_valid() {
                return Err(AppError::BadRequest(format!("{} is out of range", name)));
            }
            Ok(Some(c))
        }
        _ => Err(AppError::BadRequest(format!("{} must be given together", name))),
    }
}

#[derive(Debug, Serialize)]
pub struct PlacesResponse {
    pub places: Vec<Place>,
    pub total: usize,
    pub filtered: bool,
}

/// List places for the map, filtered and ranked by distance
pub async fn list_places(
    State(state): State<AppState>,
    Query(params): Query<PlacesQuery>,
) -> AppResult<Json<PlacesResponse>> {
    let filter = params.filter();
    let origin = params.origin()?;
    let radius = params.radius()?;

    let all = query::load_places(&state.db).await?;
    let total = all.len();
    let places = filter_and_rank(all, &filter, origin, radius);

    tracing::debug!(total, shown = places.len(), filtered = filter.is_active(), "Listed places");

    Ok(Json(PlacesResponse {
        places,
        total,
        filtered: filter.is_active(),
    }))
}

/// Source names and categories present on the map
pub async fn place_filters(State(state): State<AppState>) -> AppResult<Json<AvailableFilters>> {
    let places = query::load_places(&state.db).await?;
    Ok(Json(available_filters(&places)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceDetailQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Get place details
pub async fn get_place(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PlaceDetailQuery>,
) -> AppResult<Json<PlaceDetail>> {
    let origin = coordinates_param(params.lat, params.lng, "lat/lng")?;

    let mut place = query::load_place(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Place not found".to_string()))?;

    if let Some(origin) = origin {
        place.distance = Some(origin.distance_to(&place.coordinates()));
    }

    Ok(Json(PlaceDetail::build(place, Utc::now())))
}

#[derive(Debug, Deserialize)]
pub struct DirectionsQuery {
    pub app: MapApp,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DirectionsResponse {
    pub app: MapApp,
    pub platform: Platform,
    pub plan: DispatchPlan,
}

/// Plan how the calling device should open directions to a place
pub async fn directions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DirectionsQuery>,
    user_agent: Option<TypedHeader<UserAgent>>,
) -> AppResult<Json<DirectionsResponse>> {
    let origin = coordinates_param(params.origin_lat, params.origin_lng, "origin_lat/origin_lng")?;

    let place = query::load_place(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Place not found".to_string()))?;

    let platform = user_agent
        .map(|TypedHeader(ua)| Platform::from_user_agent(ua.as_str()))
        .unwrap_or(Platform::DESKTOP);

    let link_params = MapLinkParams {
        lat: place.lat,
        lng: place.lng,
        name: place.restaurant_name,
        address: place.address,
        origin,
    };
    let plan = plan(params.app, &link_params, platform, state.config.deep_link_timeout());

    tracing::debug!(place_id = %id, app = %params.app, os = ?platform.os, "Planned directions");

    Ok(Json(DirectionsResponse {
        app: params.app,
        platform,
        plan,
    }))
}

#[derive(Debug, Serialize)]
pub struct MapConfigResponse {
    pub naver_map_client_id: String,
    pub default_center: Coordinates,
    pub default_zoom: u8,
    pub deep_link_timeout_ms: u64,
}

/// Settings the browser needs to load the map SDK
pub async fn map_config(State(state): State<AppState>) -> Json<MapConfigResponse> {
    Json(MapConfigResponse {
        naver_map_client_id: state.config.naver_map_client_id.clone(),
        default_center: DEFAULT_CENTER,
        default_zoom: DEFAULT_ZOOM,
        deep_link_timeout_ms: state.config.deep_link_timeout_ms,
    })
}
