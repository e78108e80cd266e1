use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{admin, auth, places};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::middleware::rate_limit::{create_login_governor, create_public_governor};
use crate::storage::MAX_IMAGE_BYTES;
use crate::AppState;

/// Room for multipart framing around a maximum-size image.
const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let public_governor = create_public_governor();
    let login_governor = create_login_governor();

    // Login is limited per IP on its own, much tighter budget
    let auth_routes = Router::new()
        .route("/login", post(auth::login).layer(login_governor))
        .route(
            "/me",
            get(auth::me)
                .layer(middleware::from_fn_with_state(state.clone(), require_admin))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    // Map data for anonymous visitors
    let public_routes = Router::new()
        .route("/config", get(places::map_config))
        .route("/places", get(places::list_places))
        .route("/places/filters", get(places::place_filters))
        .route("/places/{id}", get(places::get_place))
        .route("/places/{id}/directions", get(places::directions))
        .layer(public_governor);

    // Admin routes (requires auth + an existing admin account)
    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard))
        // Restaurants
        .route(
            "/restaurants",
            get(admin::list_restaurants).post(admin::create_restaurant),
        )
        .route(
            "/restaurants/{id}",
            get(admin::get_restaurant)
                .put(admin::update_restaurant)
                .delete(admin::delete_restaurant),
        )
        // Sources
        .route("/sources", get(admin::list_sources).post(admin::create_source))
        .route(
            "/sources/{id}",
            put(admin::update_source).delete(admin::delete_source),
        )
        // Appearances
        .route("/appearances", post(admin::create_appearance))
        .route("/appearances/{id}", delete(admin::delete_appearance))
        // Images
        .route(
            "/uploads",
            post(admin::upload_image)
                .delete(admin::delete_image)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api", public_routes)
        .with_state(state)
}
