use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{appearance, restaurant, source};
use crate::error::AppResult;
use crate::places::{BroadcastInfo, Place};
use crate::utils::geo::{parse_location, ParsedLocation};

/// Load every restaurant that can be shown on the map.
pub async fn load_places(db: &DatabaseConnection) -> AppResult<Vec<Place>> {
    let restaurants = restaurant::Entity::find().all(db).await?;
    let appearances = appearance::Entity::find().all(db).await?;
    let sources = source::Entity::find().all(db).await?;

    let sources: HashMap<Uuid, source::Model> = sources.into_iter().map(|s| (s.id, s)).collect();
    let mut by_restaurant: HashMap<Uuid, Vec<appearance::Model>> = HashMap::new();
    for a in appearances {
        by_restaurant.entry(a.restaurant_id).or_default().push(a);
    }

    let mut places: Vec<Place> = restaurants
        .into_iter()
        .filter_map(|r| {
            let appearances = by_restaurant.remove(&r.id).unwrap_or_default();
            assemble_place(r, appearances, &sources)
        })
        .collect();

    places.sort_by(|a, b| a.restaurant_name.cmp(&b.restaurant_name));
    Ok(places)
}

/// Load a single place, `None` when the restaurant is missing or has no usable location.
pub async fn load_place(db: &DatabaseConnection, id: Uuid) -> AppResult<Option<Place>> {
    let Some(restaurant) = restaurant::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };

    let appearances = appearance::Entity::find()
        .filter(appearance::Column::RestaurantId.eq(id))
        .all(db)
        .await?;
    let source_ids: Vec<Uuid> = appearances.iter().map(|a| a.source_id).collect();
    let sources: HashMap<Uuid, source::Model> = source::Entity::find()
        .filter(source::Column::Id.is_in(source_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    Ok(assemble_place(restaurant, appearances, &sources))
}

/// Project a restaurant and its appearances into a `Place`.
///
/// Returns `None` when the stored location is missing or does not parse.
/// Broadcasts are ordered newest first; the newest appearance also supplies
/// the video, VOD and thumbnail links.
pub fn assemble_place(
    restaurant: restaurant::Model,
    mut appearances: Vec<appearance::Model>,
    sources: &HashMap<Uuid, source::Model>,
) -> Option<Place> {
    let coordinates = match restaurant.location.as_ref().map(parse_location) {
        Some(ParsedLocation::Point(c)) => c,
        Some(ParsedLocation::Unparseable(reason)) => {
            tracing::debug!(restaurant_id = %restaurant.id, reason = %reason, "Skipping restaurant with unparseable location");
            return None;
        }
        None => {
            tracing::debug!(restaurant_id = %restaurant.id, "Skipping restaurant without location");
            return None;
        }
    };

    appearances.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let broadcasts = appearances
        .iter()
        .filter_map(|a| {
            let source = sources.get(&a.source_id)?;
            Some(BroadcastInfo {
                source_name: source.name.clone(),
                source_type: source.kind,
                icon_url: source.icon_url.clone(),
                title: a.title.clone(),
            })
        })
        .collect();

    let latest = appearances.first();

    Some(Place {
        id: restaurant.id,
        restaurant_name: restaurant.name,
        category: restaurant.category.unwrap_or_default(),
        address: restaurant.address.unwrap_or_default(),
        lat: coordinates.lat,
        lng: coordinates.lng,
        broadcasts,
        image_url: restaurant.image_url,
        video_url: latest.and_then(|a| a.video_url.clone()),
        vod_url: latest.and_then(|a| a.vod_url.clone()),
        thumbnail_url: latest.and_then(|a| a.thumbnail_url.clone()),
        opening_hours: decode_payload(restaurant.id, "opening_hours", restaurant.opening_hours),
        menu_info: decode_payload(restaurant.id, "menu_info", restaurant.menu_info),
        distance: None,
    })
}

fn decode_payload<T: DeserializeOwned>(id: Uuid, field: &str, value: Option<Value>) -> Option<T> {
    match value? {
        Value::Null => None,
        value => serde_json::from_value(value)
            .map_err(|e| {
                tracing::debug!(restaurant_id = %id, field, error = %e, "Ignoring malformed payload");
            })
            .ok(),
    }
}
