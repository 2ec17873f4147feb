//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, xkcd::XkcdAdapter},
    config::Config,
    error::ApiError,
    web::{
        middleware::resolve_user,
        rest::{
            explanation_handler, preferences_handler, random_comic_handler,
            record_interaction_handler, update_preferences_handler, ApiDoc,
        },
        state::AppState,
    },
};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use comic_courier_core::cache::ComicCache;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize the Upstream Source & the Comic Cache ---
    let http_client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build the HTTP client: {e}")))?;
    let xkcd_adapter = Arc::new(XkcdAdapter::new(http_client, config.xkcd_base_url.clone()));
    let comic_cache = Arc::new(ComicCache::new(xkcd_adapter.clone(), db_adapter.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        comics: comic_cache,
        source: xkcd_adapter,
        store: db_adapter.clone(),
        preferences: db_adapter.clone(),
        interactions: db_adapter,
        config: config.clone(),
    });

    // --- 5. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, HeaderName::from_static("x-user-id")]);

    let api_router = Router::new()
        .route("/comic/random", get(random_comic_handler))
        .route("/explanation/{comicId}", get(explanation_handler))
        .route("/preferences", get(preferences_handler))
        .route("/preferences/update", put(update_preferences_handler))
        .route("/analytics/interaction", post(record_interaction_handler))
        .layer(axum_middleware::from_fn(resolve_user))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
