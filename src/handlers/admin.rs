use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{appearance, restaurant, source};
use crate::entities::source::SourceType;
use crate::error::{AppError, AppResult};
use crate::handlers::places::coordinates_param;
use crate::places::{MenuInfo, OpeningHours};
use crate::storage::DEFAULT_FOLDER;
use crate::utils::geo::{parse_location, Coordinates, ParsedLocation};
use crate::AppState;

/// Trim a free-text field, treating blank input as absent.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Column widths from the schema.
const SOURCE_NAME_MAX: usize = 100;
const RESTAURANT_NAME_MAX: usize = 200;
const CATEGORY_MAX: usize = 100;

fn check_len(value: &str, max: usize, field: &str) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn required_name(name: &str, what: &str, max: usize) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest(format!("{} name is required", what)));
    }
    check_len(name, max, &format!("{} name", what))?;
    Ok(name.to_string())
}

fn category(value: Option<String>) -> AppResult<Option<String>> {
    let value = clean(value);
    if let Some(c) = &value {
        check_len(c, CATEGORY_MAX, "Category")?;
    }
    Ok(value)
}

/// GeoJSON location from an optional lat/lng pair.
fn location_from(lat: Option<f64>, lng: Option<f64>) -> AppResult<Option<Value>> {
    Ok(coordinates_param(lat, lng, "lat/lng")?.map(|c| c.to_geojson()))
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

/// The stored image URL an update leaves behind, if the update touched the
/// field and changed it.
fn replaced(old: Option<String>, new: Option<Option<String>>) -> Option<String> {
    match (old, new) {
        (Some(old), Some(new)) if new.as_deref() != Some(old.as_str()) => Some(old),
        _ => None,
    }
}

// ============ Restaurants ============

#[derive(Debug, Deserialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub image_url: Option<String>,
    pub menu_info: Option<MenuInfo>,
    pub opening_hours: Option<OpeningHours>,
}

/// Partial update. Absent fields are left alone; blank strings clear a field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub image_url: Option<String>,
    pub menu_info: Option<MenuInfo>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Serialize)]
pub struct RestaurantResponse {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub location: Option<Coordinates>,
    /// Set when a stored location exists but cannot be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_error: Option<String>,
    pub image_url: Option<String>,
    pub menu_info: Option<Value>,
    pub opening_hours: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<restaurant::Model> for RestaurantResponse {
    fn from(r: restaurant::Model) -> Self {
        let (location, location_error) = match r.location.as_ref().map(parse_location) {
            Some(ParsedLocation::Point(c)) => (Some(c), None),
            Some(ParsedLocation::Unparseable(reason)) => (None, Some(reason)),
            None => (None, None),
        };

        Self {
            id: r.id,
            name: r.name,
            category: r.category,
            address: r.address,
            location,
            location_error,
            image_url: r.image_url,
            menu_info: r.menu_info,
            opening_hours: r.opening_hours,
            created_at: r.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AppearanceResponse {
    pub id: Uuid,
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub vod_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub metadata: Option<Value>,
    pub source: Option<source::Model>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RestaurantDetailResponse {
    #[serde(flatten)]
    pub restaurant: RestaurantResponse,
    pub appearances: Vec<AppearanceResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RestaurantListQuery {
    pub q: Option<String>,
}

/// Case-insensitive match of a search term against name, category or address.
fn restaurant_matches(restaurant: &restaurant::Model, q: &str) -> bool {
    let q = q.to_lowercase();
    let hit = |s: &str| s.to_lowercase().contains(&q);

    hit(&restaurant.name)
        || restaurant.category.as_deref().is_some_and(hit)
        || restaurant.address.as_deref().is_some_and(hit)
}

/// List restaurants, newest first (admin)
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(params): Query<RestaurantListQuery>,
) -> AppResult<Json<Vec<RestaurantResponse>>> {
    let restaurants = restaurant::Entity::find()
        .order_by_desc(restaurant::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let restaurants = match clean(params.q) {
        Some(q) => restaurants
            .into_iter()
            .filter(|r| restaurant_matches(r, &q))
            .collect(),
        None => restaurants,
    };

    Ok(Json(restaurants.into_iter().map(RestaurantResponse::from).collect()))
}

/// Get a restaurant with its appearances (admin)
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RestaurantDetailResponse>> {
    let restaurant = restaurant::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let appearances = appearance::Entity::find()
        .filter(appearance::Column::RestaurantId.eq(id))
        .order_by_desc(appearance::Column::CreatedAt)
        .find_also_related(source::Entity)
        .all(&state.db)
        .await?;

    let appearances = appearances
        .into_iter()
        .map(|(a, s)| AppearanceResponse {
            id: a.id,
            title: a.title,
            video_url: a.video_url,
            vod_url: a.vod_url,
            thumbnail_url: a.thumbnail_url,
            metadata: a.metadata,
            source: s,
            created_at: a.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(RestaurantDetailResponse {
        restaurant: restaurant.into(),
        appearances,
    }))
}

/// Create a restaurant (admin)
pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<Json<RestaurantResponse>> {
    let name = required_name(&payload.name, "Restaurant", RESTAURANT_NAME_MAX)?;
    let category = category(payload.category)?;
    let location = location_from(payload.lat, payload.lng)?;
    let menu_info = payload.menu_info.as_ref().map(to_json).transpose()?;
    let opening_hours = payload.opening_hours.as_ref().map(to_json).transpose()?;

    let restaurant = restaurant::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        category: Set(category),
        address: Set(clean(payload.address)),
        location: Set(location),
        image_url: Set(clean(payload.image_url)),
        menu_info: Set(menu_info),
        opening_hours: Set(opening_hours),
        created_at: Set(Utc::now().into()),
    };

    let result = restaurant.insert(&state.db).await?;
    tracing::info!(restaurant_id = %result.id, name = %result.name, "Restaurant created");
    Ok(Json(result.into()))
}

/// Update a restaurant (admin)
pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> AppResult<Json<RestaurantResponse>> {
    let restaurant = restaurant::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let old_image = restaurant.image_url.clone();
    let mut active: restaurant::ActiveModel = restaurant.into();

    if let Some(name) = payload.name {
        active.name = Set(required_name(&name, "Restaurant", RESTAURANT_NAME_MAX)?);
    }

    if let Some(value) = payload.category {
        active.category = Set(category(Some(value))?);
    }

    if let Some(address) = payload.address {
        active.address = Set(clean(Some(address)));
    }

    // Location is only rewritten when a full pair arrives
    if let Some(location) = location_from(payload.lat, payload.lng)? {
        active.location = Set(Some(location));
    }

    let new_image = payload.image_url.map(|url| clean(Some(url)));
    if let Some(image) = &new_image {
        active.image_url = Set(image.clone());
    }

    if let Some(menu) = payload.menu_info {
        active.menu_info = Set(Some(to_json(&menu)?));
    }

    if let Some(hours) = payload.opening_hours {
        active.opening_hours = Set(Some(to_json(&hours)?));
    }

    let result = active.update(&state.db).await?;

    if let Some(old) = replaced(old_image, new_image) {
        state.storage.delete_by_url(&old).await;
    }

    Ok(Json(result.into()))
}

/// Delete a restaurant together with its appearances (admin)
pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let txn = state.db.begin().await?;

    let Some(restaurant) = restaurant::Entity::find_by_id(id).one(&txn).await? else {
        txn.rollback().await?;
        return Err(AppError::NotFound("Restaurant not found".to_string()));
    };

    let removed = appearance::Entity::delete_many()
        .filter(appearance::Column::RestaurantId.eq(id))
        .exec(&txn)
        .await?;
    restaurant::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(restaurant_id = %id, appearances = removed.rows_affected, "Restaurant deleted");

    if let Some(image) = &restaurant.image_url {
        state.storage.delete_by_url(image).await;
    }

    Ok(Json(serde_json::json!({
        "message": "Restaurant deleted",
        "appearances_deleted": removed.rows_affected,
    })))
}

// ============ Sources ============

#[derive(Debug, Default, Deserialize)]
pub struct SourceListQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSourceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceType,
    pub icon_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSourceRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SourceType>,
    pub icon_url: Option<String>,
}

/// Case-insensitive match of a search term against a source's name or type.
fn source_matches(source: &source::Model, q: &str) -> bool {
    let q = q.to_lowercase();
    source.name.to_lowercase().contains(&q) || source.kind.as_str().to_lowercase().contains(&q)
}

/// List sources by name (admin)
pub async fn list_sources(
    State(state): State<AppState>,
    Query(params): Query<SourceListQuery>,
) -> AppResult<Json<Vec<source::Model>>> {
    let sources = source::Entity::find()
        .order_by_asc(source::Column::Name)
        .all(&state.db)
        .await?;

    let sources = match clean(params.q) {
        Some(q) => sources.into_iter().filter(|s| source_matches(s, &q)).collect(),
        None => sources,
    };

    Ok(Json(sources))
}

async fn ensure_name_free(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut query = source::Entity::find().filter(source::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(source::Column::Id.ne(id));
    }

    if query.one(&state.db).await?.is_some() {
        return Err(AppError::Conflict(format!("Source '{}' already exists", name)));
    }
    Ok(())
}

/// Create a source (admin)
pub async fn create_source(
    State(state): State<AppState>,
    Json(payload): Json<CreateSourceRequest>,
) -> AppResult<Json<source::Model>> {
    let name = required_name(&payload.name, "Source", SOURCE_NAME_MAX)?;
    ensure_name_free(&state, &name, None).await?;

    let source = source::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        kind: Set(payload.kind),
        icon_url: Set(clean(payload.icon_url)),
        created_at: Set(Utc::now().into()),
    };

    let result = source.insert(&state.db).await?;
    tracing::info!(source_id = %result.id, name = %result.name, "Source created");
    Ok(Json(result))
}

/// Update a source, removing a replaced icon from storage (admin)
pub async fn update_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSourceRequest>,
) -> AppResult<Json<source::Model>> {
    let source = source::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Source not found".to_string()))?;

    let old_icon = source.icon_url.clone();
    let mut active: source::ActiveModel = source.into();

    if let Some(name) = payload.name {
        let name = required_name(&name, "Source", SOURCE_NAME_MAX)?;
        ensure_name_free(&state, &name, Some(id)).await?;
        active.name = Set(name);
    }

    if let Some(kind) = payload.kind {
        active.kind = Set(kind);
    }

    let new_icon = payload.icon_url.map(|url| clean(Some(url)));
    if let Some(icon) = &new_icon {
        active.icon_url = Set(icon.clone());
    }

    let result = active.update(&state.db).await?;

    if let Some(old) = replaced(old_icon, new_icon) {
        state.storage.delete_by_url(&old).await;
    }

    Ok(Json(result))
}

/// Delete a source that no appearance refers to (admin)
pub async fn delete_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let source = source::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Source not found".to_string()))?;

    let in_use = appearance::Entity::find()
        .filter(appearance::Column::SourceId.eq(id))
        .count(&state.db)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Source '{}' is used by {} appearance(s)",
            source.name, in_use
        )));
    }

    source::Entity::delete_by_id(id).exec(&state.db).await?;

    if let Some(icon) = &source.icon_url {
        state.storage.delete_by_url(icon).await;
    }

    tracing::info!(source_id = %id, "Source deleted");
    Ok(Json(serde_json::json!({ "message": "Source deleted" })))
}

// ============ Appearances ============

#[derive(Debug, Deserialize)]
pub struct CreateAppearanceRequest {
    pub restaurant_id: Uuid,
    pub source_id: Uuid,
    pub title: Option<String>,
    pub video_url: Option<String>,
    pub vod_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub metadata: Option<Value>,
}

/// Record that a restaurant was featured by a source (admin)
pub async fn create_appearance(
    State(state): State<AppState>,
    Json(payload): Json<CreateAppearanceRequest>,
) -> AppResult<Json<appearance::Model>> {
    restaurant::Entity::find_by_id(payload.restaurant_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid restaurant".to_string()))?;

    source::Entity::find_by_id(payload.source_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid source".to_string()))?;

    let appearance = appearance::ActiveModel {
        id: Set(Uuid::new_v4()),
        restaurant_id: Set(payload.restaurant_id),
        source_id: Set(payload.source_id),
        title: Set(clean(payload.title)),
        video_url: Set(clean(payload.video_url)),
        vod_url: Set(clean(payload.vod_url)),
        thumbnail_url: Set(clean(payload.thumbnail_url)),
        metadata: Set(payload.metadata),
        created_at: Set(Utc::now().into()),
    };

    let result = appearance.insert(&state.db).await?;
    Ok(Json(result))
}

/// Delete an appearance (admin)
pub async fn delete_appearance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let result = appearance::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Appearance not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "Appearance deleted" })))
}

// ============ Dashboard ============

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub restaurants: u64,
    pub sources: u64,
    pub appearances: u64,
    pub recent_restaurants: Vec<RestaurantResponse>,
}

/// Counts and the most recently added restaurants (admin)
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<DashboardResponse>> {
    let (restaurants, sources, appearances, recent) = tokio::try_join!(
        restaurant::Entity::find().count(&state.db),
        source::Entity::find().count(&state.db),
        appearance::Entity::find().count(&state.db),
        restaurant::Entity::find()
            .order_by_desc(restaurant::Column::CreatedAt)
            .limit(5)
            .all(&state.db),
    )?;

    Ok(Json(DashboardResponse {
        restaurants,
        sources,
        appearances,
        recent_restaurants: recent.into_iter().map(RestaurantResponse::from).collect(),
    }))
}

// ============ Uploads ============

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub folder: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Upload an image from the multipart field `file` (admin)
pub async fn upload_image(
    State(state): State<AppState>,
    Query(params): Query<UploadQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let folder = clean(params.folder).unwrap_or_else(|| DEFAULT_FOLDER.to_string());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let url = state
            .storage
            .upload_image(&folder, &file_name, &content_type, bytes.to_vec())
            .await?;
        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::BadRequest("Missing file field".to_string()))
}

/// Delete a previously uploaded image by its public URL (admin)
pub async fn delete_image(
    State(state): State<AppState>,
    Json(payload): Json<UploadResponse>,
) -> AppResult<Json<Value>> {
    state.storage.delete_by_url(&payload.url).await;
    Ok(Json(serde_json::json!({ "message": "Image deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn restaurant_model(location: Option<Value>) -> restaurant::Model {
        restaurant::Model {
            id: Uuid::new_v4(),
            name: "성수 감자탕".to_string(),
            category: Some("한식".to_string()),
            address: None,
            location,
            image_url: None,
            menu_info: None,
            opening_hours: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap().into(),
        }
    }

    #[test]
    fn test_clean_trims_and_drops_blank() {
        assert_eq!(clean(Some("  한식 ".to_string())), Some("한식".to_string()));
        assert_eq!(clean(Some("   ".to_string())), None);
        assert_eq!(clean(None), None);
    }

    #[test]
    fn test_required_name() {
        assert_eq!(required_name(" 쯔양 ", "Source", SOURCE_NAME_MAX).unwrap(), "쯔양");
        assert!(matches!(
            required_name("  ", "Source", SOURCE_NAME_MAX),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_names_longer_than_columns_are_rejected() {
        let at_limit = "가".repeat(SOURCE_NAME_MAX);
        assert!(required_name(&at_limit, "Source", SOURCE_NAME_MAX).is_ok());

        let too_long = "가".repeat(SOURCE_NAME_MAX + 1);
        assert!(matches!(
            required_name(&too_long, "Source", SOURCE_NAME_MAX),
            Err(AppError::BadRequest(_))
        ));
        assert!(required_name(&"a".repeat(RESTAURANT_NAME_MAX + 1), "Restaurant", RESTAURANT_NAME_MAX).is_err());
        assert!(category(Some("x".repeat(CATEGORY_MAX + 1))).is_err());
        assert_eq!(category(Some(" 한식 ".to_string())).unwrap(), Some("한식".to_string()));
    }

    #[test]
    fn test_restaurant_search_fields() {
        let mut r = restaurant_model(None);
        r.address = Some("서울 성동구 성수이로".to_string());

        assert!(restaurant_matches(&r, "감자탕"));
        assert!(restaurant_matches(&r, "한식"));
        assert!(restaurant_matches(&r, "성동구"));
        assert!(!restaurant_matches(&r, "중식"));

        r.name = "Gamjatang House".to_string();
        assert!(restaurant_matches(&r, "gamja"));
    }

    #[test]
    fn test_replaced_image() {
        let old = Some("https://x/old.png".to_string());
        assert_eq!(replaced(old.clone(), Some(Some("https://x/new.png".to_string()))), old);
        assert_eq!(replaced(old.clone(), Some(None)), old);
        assert_eq!(replaced(old.clone(), Some(old.clone())), None);
        assert_eq!(replaced(old, None), None);
        assert_eq!(replaced(None, Some(Some("https://x/new.png".to_string()))), None);
    }

    #[test]
    fn test_location_from_writes_geojson() {
        let location = location_from(Some(37.5), Some(127.0)).unwrap().unwrap();
        assert_eq!(location, json!({ "type": "Point", "coordinates": [127.0, 37.5] }));

        assert_eq!(location_from(None, None).unwrap(), None);
        assert!(location_from(Some(37.5), None).is_err());
        assert!(location_from(Some(f64::NAN), Some(127.0)).is_err());
    }

    #[test]
    fn test_response_reads_location() {
        let response = RestaurantResponse::from(restaurant_model(Some(json!({
            "type": "Point",
            "coordinates": [127.0, 37.5]
        }))));
        assert_eq!(response.location, Some(Coordinates::new(37.5, 127.0)));
        assert!(response.location_error.is_none());
    }

    #[test]
    fn test_response_reports_bad_location() {
        let response = RestaurantResponse::from(restaurant_model(Some(json!("somewhere"))));
        assert!(response.location.is_none());
        assert!(response.location_error.is_some());

        let response = RestaurantResponse::from(restaurant_model(None));
        assert!(response.location.is_none());
        assert!(response.location_error.is_none());
    }

    #[test]
    fn test_source_matches_name_or_type() {
        let source = source::Model {
            id: Uuid::new_v4(),
            name: "흑백요리사".to_string(),
            kind: SourceType::Tv,
            icon_url: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap().into(),
        };

        assert!(source_matches(&source, "흑백"));
        assert!(source_matches(&source, "tv"));
        assert!(!source_matches(&source, "youtube"));
    }

    #[test]
    fn test_update_request_defaults_to_no_change() {
        let req: UpdateRestaurantRequest = serde_json::from_value(json!({ "lat": 37.5 })).unwrap();
        assert!(req.name.is_none());
        assert!(location_from(req.lat, req.lng).is_err());
    }

    mod cascade {
        use std::collections::BTreeMap;

        use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

        use super::*;
        use crate::config::{Config, StorageConfig};
        use crate::storage::ObjectStorage;

        fn state(db: DatabaseConnection) -> AppState {
            let storage = StorageConfig {
                base_url: "https://demo.supabase.co".to_string(),
                service_key: "key".to_string(),
                bucket: "source-pins".to_string(),
            };
            AppState {
                db,
                config: Config {
                    database_url: "postgres://localhost/test".to_string(),
                    jwt_secret: "secret".to_string(),
                    jwt_expiration_hours: 24,
                    server_host: "127.0.0.1".to_string(),
                    server_port: 3000,
                    storage: storage.clone(),
                    naver_map_client_id: String::new(),
                    deep_link_timeout_ms: 2000,
                    admin_seed: None,
                },
                storage: ObjectStorage::new(reqwest::Client::new(), storage),
            }
        }

        fn source_model(id: Uuid) -> source::Model {
            source::Model {
                id,
                name: "흑백요리사".to_string(),
                kind: SourceType::Tv,
                icon_url: None,
                created_at: Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap().into(),
            }
        }

        fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
            BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
        }

        fn exec(rows_affected: u64) -> MockExecResult {
            MockExecResult {
                last_insert_id: 0,
                rows_affected,
            }
        }

        #[tokio::test]
        async fn test_source_in_use_is_refused() {
            let id = Uuid::new_v4();
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![source_model(id)]])
                .append_query_results([vec![count_row(2)]])
                .into_connection();

            let result = delete_source(State(state(db.clone())), Path(id)).await;

            let Err(err) = result else {
                panic!("deleting a source with appearances must fail");
            };
            assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
            let log = format!("{:?}", db.into_transaction_log());
            assert!(!log.contains("DELETE"), "{log}");
        }

        #[tokio::test]
        async fn test_unused_source_is_deleted() {
            let id = Uuid::new_v4();
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![source_model(id)]])
                .append_query_results([vec![count_row(0)]])
                .append_exec_results([exec(1)])
                .into_connection();

            assert!(delete_source(State(state(db.clone())), Path(id)).await.is_ok());
            let log = format!("{:?}", db.into_transaction_log());
            assert!(log.contains("DELETE FROM"), "{log}");
        }

        #[tokio::test]
        async fn test_missing_restaurant_rolls_back() {
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<restaurant::Model>::new()])
                .into_connection();

            let result = delete_restaurant(State(state(db.clone())), Path(Uuid::new_v4())).await;

            assert!(matches!(result, Err(AppError::NotFound(_))));
            let log = format!("{:?}", db.into_transaction_log());
            assert!(log.contains("ROLLBACK"), "{log}");
            assert!(!log.contains("COMMIT"), "{log}");
            assert!(!log.contains("DELETE"), "{log}");
        }

        #[tokio::test]
        async fn test_restaurant_delete_removes_appearances_in_one_transaction() {
            let restaurant = restaurant_model(None);
            let id = restaurant.id;
            let db = MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![restaurant]])
                .append_exec_results([exec(2), exec(1)])
                .into_connection();

            let Json(body) = delete_restaurant(State(state(db.clone())), Path(id))
                .await
                .unwrap();
            assert_eq!(body["appearances_deleted"], 2);

            let log = db.into_transaction_log();
            assert_eq!(log.len(), 1);
            let log = format!("{:?}", log);
            assert!(log.contains("appearance"), "{log}");
            assert!(log.contains("COMMIT"), "{log}");
            assert!(!log.contains("ROLLBACK"), "{log}");
        }
    }
}
