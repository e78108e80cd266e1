use std::net::SocketAddr;
use std::time::Duration;

use axum::middleware;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use from_screen::{
    config::{AdminSeed, Config},
    db,
    entities::admin_user,
    handlers::auth::hash_password,
    middleware::rate_limit::log_request,
    routes,
    storage::ObjectStorage,
    AppResult, AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "from_screen=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    db::migrate(&db).await.expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    match &config.admin_seed {
        Some(seed) => seed_admin(&db, seed).await.expect("Failed to seed admin account"),
        None => tracing::info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin seed"),
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client");
    let storage = ObjectStorage::new(http, config.storage.clone());

    // Create app state
    let state = AppState {
        db,
        config: config.clone(),
        storage,
    };

    // Create router with middleware
    let app = routes::create_router(state)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

/// Create the configured admin account if it doesn't exist
async fn seed_admin(db: &DatabaseConnection, seed: &AdminSeed) -> AppResult<()> {
    let existing = admin_user::Entity::find()
        .filter(admin_user::Column::Email.eq(&seed.email))
        .one(db)
        .await?;

    if existing.is_some() {
        tracing::debug!(email = %seed.email, "Admin account already present");
        return Ok(());
    }

    let admin = admin_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(seed.email.clone()),
        password_hash: Set(hash_password(&seed.password)?),
        created_at: Set(Utc::now().into()),
    };

    admin.insert(db).await?;
    tracing::info!("Admin account created: {}", seed.email);
    Ok(())
}
