//! Lodge Registry Backend
//!
//! REST backend for a lodge member registry with SQLite persistence,
//! PDF member cards, bulk Excel reconciliation and a task list.

mod api;
mod bulk;
mod cards;
mod config;
mod db;
mod errors;
mod models;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cards::CardRenderer;
use config::Config;
use db::Repository;

/// Largest accepted spreadsheet upload.
const IMPORT_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub cards: Arc<CardRenderer>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lodge Registry Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Lodge: {}", config.lodge_name);

    let features = config.features();
    if !features.email {
        tracing::info!("Email not configured (LODGE_SMTP_*), email features disabled");
    }
    if !features.ai {
        tracing::info!("AI assistant not configured (LODGE_AI_API_KEY), disabled");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let stats = repo.member_statistics().await?;
    tracing::info!(
        "Member registry loaded: {} members, {} active",
        stats.total,
        stats.active
    );

    // Fonts are read once; a missing font only downgrades rendering
    let cards = Arc::new(CardRenderer::from_config(&config));

    // Create application state
    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
        cards,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // API routes
    let api_routes = Router::new()
        .route("/features", get(api::get_features))
        // Members
        .route("/members", get(api::list_members))
        .route("/members", post(api::create_member))
        .route("/members/statistics", get(api::member_statistics))
        .route("/members/export", get(api::export_spreadsheet))
        .route(
            "/members/import",
            post(api::import_spreadsheet).layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT)),
        )
        .route("/members/bulk-change", post(api::bulk_change))
        .route("/members/batch", put(api::batch_update_members))
        .route("/members/{id}", get(api::get_member))
        .route("/members/{id}", put(api::update_member))
        // Cards
        .route("/members/{id}/card", get(api::download_card))
        .route("/cards/archive", get(api::download_card_archive))
        // Tasks
        .route("/tasks", get(api::list_tasks))
        .route("/tasks", post(api::create_task))
        .route("/tasks/upcoming", get(api::upcoming_tasks))
        .route("/tasks/overdue", get(api::overdue_tasks))
        .route("/tasks/{id}/status", put(api::update_task_status))
        .route("/tasks/{id}", delete(api::delete_task));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
