//! The map-facing read model: one `Place` per restaurant with resolvable
//! coordinates, carrying every broadcast it appeared in.

pub mod detail;
pub mod filter;
pub mod query;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::source::SourceType;
use crate::utils::geo::Coordinates;

pub use detail::PlaceDetail;
pub use filter::{available_filters, filter_and_rank, AvailableFilters, PlaceFilter};

/// Placeholder shown for missing values.
pub const NO_INFO: &str = "정보 없음";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastInfo {
    pub source_name: String,
    pub source_type: SourceType,
    pub icon_url: Option<String>,
    pub title: Option<String>,
}

/// Either a single free-text description or a weekday (`월`..`일`) map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpeningHours {
    Text(String),
    Weekly(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Structured menu items, or the older newline separated `name:price` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenuInfo {
    Items(Vec<MenuItem>),
    Legacy(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: Uuid,
    pub restaurant_name: String,
    pub category: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub broadcasts: Vec<BroadcastInfo>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub vod_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub opening_hours: Option<OpeningHours>,
    pub menu_info: Option<MenuInfo>,
    /// Kilometres from the requesting user, when their location is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Place {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}
